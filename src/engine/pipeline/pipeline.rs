use serde_json::Value;
use tracing::{debug, info};

use super::document_source::{DocumentSource, GetNextResult, PositionRequirement, StageInput};
use crate::engine::errors::MergeError;
use crate::engine::executor::OperationContext;
use crate::engine::types::Document;

const LOG_TARGET: &str = "cursor_merge::pipeline";

/// An ordered chain of stages; documents are pulled from the last stage,
/// which pulls from the one before it.
pub struct Pipeline {
    sources: Vec<Box<dyn DocumentSource>>,
    disposed: bool,
}

impl Pipeline {
    /// Builds a pipeline, rejecting stages placed where their constraints
    /// forbid.
    pub fn new(sources: Vec<Box<dyn DocumentSource>>) -> Result<Self, MergeError> {
        let last = sources.len().saturating_sub(1);
        for (idx, source) in sources.iter().enumerate() {
            match source.constraints().position {
                PositionRequirement::First if idx != 0 => {
                    return Err(MergeError::InvalidPipeline(format!(
                        "{} is only valid as the first stage, found at position {}",
                        source.source_name(),
                        idx
                    )));
                }
                PositionRequirement::Last if idx != last => {
                    return Err(MergeError::InvalidPipeline(format!(
                        "{} is only valid as the last stage, found at position {}",
                        source.source_name(),
                        idx
                    )));
                }
                _ => {}
            }
        }

        Ok(Self {
            sources,
            disposed: false,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[Box<dyn DocumentSource>] {
        &self.sources
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.source_name()).collect()
    }

    /// Gives every stage one chance to rewrite the stages that follow it.
    pub fn optimize(&mut self) {
        let before = self.sources.len();
        let mut idx = 0;
        while idx < self.sources.len() {
            let mut source = self.sources.remove(idx);
            source.optimize_at(idx, &mut self.sources);
            self.sources.insert(idx, source);
            idx += 1;
        }

        if self.sources.len() != before {
            debug!(
                target: LOG_TARGET,
                before,
                after = self.sources.len(),
                stages = ?self.stage_names(),
                "Pipeline optimized"
            );
        }
    }

    pub fn get_next(&mut self) -> Result<GetNextResult, MergeError> {
        if self.disposed {
            return Err(MergeError::Disposed);
        }
        StageInput::new(&mut self.sources).next()
    }

    /// Pulls until a document is produced or the pipeline ends, yielding to
    /// the scheduler while execution is paused.
    pub async fn next_document(&mut self) -> Result<Option<Document>, MergeError> {
        loop {
            match self.get_next()? {
                GetNextResult::Advanced(doc) => return Ok(Some(doc)),
                GetNextResult::Eof => return Ok(None),
                GetNextResult::PauseExecution => tokio::task::yield_now().await,
            }
        }
    }

    pub fn serialize(&self) -> Result<Vec<Value>, MergeError> {
        let mut stages = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            stages.extend(source.serialize_to_array()?);
        }
        Ok(stages)
    }

    pub fn detach_from_operation_context(&mut self) {
        for source in &mut self.sources {
            source.detach_from_operation_context();
        }
    }

    pub fn reattach_to_operation_context(&mut self, ctx: OperationContext) {
        for source in &mut self.sources {
            source.reattach_to_operation_context(ctx.clone());
        }
    }

    /// Disposes every stage. Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for source in &mut self.sources {
            source.dispose();
        }
        info!(target: LOG_TARGET, stages = self.sources.len(), "Pipeline disposed");
    }
}
