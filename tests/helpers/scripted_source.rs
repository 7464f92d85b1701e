use std::any::Any;
use std::collections::VecDeque;

use serde_json::{Value, json};

use crate::engine::errors::MergeError;
use crate::engine::pipeline::{
    DocumentSource, GetNextResult, PositionRequirement, StageConstraints, StageInput,
};
use crate::engine::types::Document;

/// A first-position stage replaying a fixed script of results, then EOF.
pub struct ScriptedSource {
    script: VecDeque<GetNextResult>,
    disposed: bool,
}

impl ScriptedSource {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            script: docs.into_iter().map(GetNextResult::Advanced).collect(),
            disposed: false,
        }
    }

    /// Inserts a pause before the document at `index`.
    pub fn with_pause_at(mut self, index: usize) -> Self {
        let index = index.min(self.script.len());
        self.script.insert(index, GetNextResult::PauseExecution);
        self
    }

    pub fn boxed(self) -> Box<dyn DocumentSource> {
        Box::new(self)
    }
}

impl DocumentSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "$scripted"
    }

    fn get_next(&mut self, _input: StageInput<'_>) -> Result<GetNextResult, MergeError> {
        if self.disposed {
            return Err(MergeError::Disposed);
        }
        Ok(self.script.pop_front().unwrap_or(GetNextResult::Eof))
    }

    fn constraints(&self) -> StageConstraints {
        StageConstraints {
            position: PositionRequirement::First,
            requires_input_source: false,
            ..StageConstraints::default()
        }
    }

    fn serialize(&self) -> Result<Value, MergeError> {
        Ok(json!({"$scripted": self.script.len()}))
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
