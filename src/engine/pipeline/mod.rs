mod document_source;
mod limit_stage;
mod pipeline;
mod sort_stage;


pub use document_source::{
    DiskUseRequirement, DocumentSource, FacetRequirement, GetNextResult, HostTypeRequirement,
    PositionRequirement, StageConstraints, StageInput, TransactionRequirement,
};
pub use limit_stage::{LIMIT_STAGE_NAME, LimitStage};
pub use pipeline::Pipeline;
pub use sort_stage::{SORT_STAGE_NAME, SortStage};
