use std::any::Any;

use serde_json::Value;

use crate::engine::errors::MergeError;
use crate::engine::executor::OperationContext;
use crate::engine::types::Document;

/// Outcome of asking a stage for its next document.
#[derive(Debug, PartialEq)]
pub enum GetNextResult {
    Advanced(Document),
    /// Nothing is available yet; the caller should yield and ask again.
    PauseExecution,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionRequirement {
    None,
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTypeRequirement {
    None,
    AnyShard,
    LocalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskUseRequirement {
    NoDiskUse,
    WritesTmpData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetRequirement {
    Allowed,
    NotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRequirement {
    Allowed,
    NotAllowed,
}

/// Static placement rules a stage imposes on the pipeline it is part of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConstraints {
    pub streaming: bool,
    pub position: PositionRequirement,
    pub host_type: HostTypeRequirement,
    pub disk_use: DiskUseRequirement,
    pub facet: FacetRequirement,
    pub transaction: TransactionRequirement,
    pub requires_input_source: bool,
}

impl Default for StageConstraints {
    fn default() -> Self {
        Self {
            streaming: true,
            position: PositionRequirement::None,
            host_type: HostTypeRequirement::None,
            disk_use: DiskUseRequirement::NoDiskUse,
            facet: FacetRequirement::Allowed,
            transaction: TransactionRequirement::Allowed,
            requires_input_source: true,
        }
    }
}

/// The stages upstream of the one being pulled, last element nearest.
pub struct StageInput<'a> {
    upstream: &'a mut [Box<dyn DocumentSource>],
}

impl<'a> StageInput<'a> {
    pub fn new(upstream: &'a mut [Box<dyn DocumentSource>]) -> Self {
        Self { upstream }
    }

    /// Pulls the next document from the nearest upstream stage. A stage
    /// with no upstream sees end of input.
    pub fn next(&mut self) -> Result<GetNextResult, MergeError> {
        match self.upstream.split_last_mut() {
            Some((nearest, rest)) => nearest.get_next(StageInput::new(rest)),
            None => Ok(GetNextResult::Eof),
        }
    }
}

/// A pull-based pipeline stage.
pub trait DocumentSource: Send + Any {
    fn source_name(&self) -> &'static str;

    fn get_next(&mut self, input: StageInput<'_>) -> Result<GetNextResult, MergeError>;

    fn constraints(&self) -> StageConstraints {
        StageConstraints::default()
    }

    /// Peephole rewrite against the stages following this one. `container`
    /// holds the pipeline without this stage, so `container[position]` is
    /// the stage directly after it.
    fn optimize_at(&mut self, _position: usize, _container: &mut Vec<Box<dyn DocumentSource>>) {}

    fn serialize(&self) -> Result<Value, MergeError>;

    fn serialize_to_array(&self) -> Result<Vec<Value>, MergeError> {
        Ok(vec![self.serialize()?])
    }

    fn detach_from_operation_context(&mut self) {}

    fn reattach_to_operation_context(&mut self, _ctx: OperationContext) {}

    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}
