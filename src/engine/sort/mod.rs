mod comparator;
mod sort_spec;

#[cfg(test)]
mod sort_spec_test;

pub use comparator::{compare_values, lookup_path};
pub use sort_spec::{SortDirection, SortKey, SortSpec};
