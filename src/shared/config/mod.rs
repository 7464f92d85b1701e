mod model;

#[cfg(test)]
mod model_test;

pub use model::{LoggingConfig, MergerConfig, Settings};
