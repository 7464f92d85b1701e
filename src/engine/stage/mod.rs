mod merge_cursors;
mod spec;

#[cfg(test)]
mod spec_test;

pub use merge_cursors::{MergeCursorsStage, STAGE_NAME, StageState};
pub use spec::{parse_body, parse_stage, serialize_stage};
