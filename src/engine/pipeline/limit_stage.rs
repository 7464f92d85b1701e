use std::any::Any;

use serde_json::{Value, json};

use super::document_source::{DocumentSource, GetNextResult, StageInput};
use crate::engine::errors::MergeError;

pub const LIMIT_STAGE_NAME: &str = "$limit";

pub struct LimitStage {
    limit: u64,
    returned: u64,
}

impl LimitStage {
    pub fn new(limit: u64) -> Self {
        Self { limit, returned: 0 }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl DocumentSource for LimitStage {
    fn source_name(&self) -> &'static str {
        LIMIT_STAGE_NAME
    }

    fn get_next(&mut self, mut input: StageInput<'_>) -> Result<GetNextResult, MergeError> {
        if self.returned >= self.limit {
            return Ok(GetNextResult::Eof);
        }

        let next = input.next()?;
        if let GetNextResult::Advanced(_) = next {
            self.returned += 1;
        }
        Ok(next)
    }

    fn serialize(&self) -> Result<Value, MergeError> {
        Ok(json!({ LIMIT_STAGE_NAME: self.limit }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
