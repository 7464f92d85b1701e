use std::any::Any;
use std::collections::VecDeque;

use serde_json::{Value, json};

use super::document_source::{
    DiskUseRequirement, DocumentSource, GetNextResult, StageConstraints, StageInput,
};
use super::limit_stage::LimitStage;
use crate::engine::errors::MergeError;
use crate::engine::sort::SortSpec;
use crate::engine::types::Document;

pub const SORT_STAGE_NAME: &str = "$sort";

/// Blocking `$sort`: consumes its whole input before returning anything.
/// The sort is stable, so documents with equal keys keep their input order.
pub struct SortStage {
    spec: SortSpec,
    limit: Option<u64>,
    pending: Vec<Document>,
    sorted: Option<VecDeque<Document>>,
}

impl SortStage {
    pub fn new(spec: SortSpec) -> Self {
        Self {
            spec,
            limit: None,
            pending: Vec::new(),
            sorted: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn from_json(pattern: &Value) -> Result<Self, MergeError> {
        Ok(Self::new(SortSpec::from_json(pattern)?))
    }

    pub fn spec(&self) -> &SortSpec {
        &self.spec
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    fn finish_input(&mut self) -> VecDeque<Document> {
        let mut docs = std::mem::take(&mut self.pending);
        docs.sort_by(|a, b| self.spec.compare(a, b));
        if let Some(limit) = self.limit {
            docs.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        docs.into()
    }
}

impl DocumentSource for SortStage {
    fn source_name(&self) -> &'static str {
        SORT_STAGE_NAME
    }

    fn get_next(&mut self, mut input: StageInput<'_>) -> Result<GetNextResult, MergeError> {
        while self.sorted.is_none() {
            match input.next()? {
                GetNextResult::Advanced(doc) => self.pending.push(doc),
                GetNextResult::PauseExecution => return Ok(GetNextResult::PauseExecution),
                GetNextResult::Eof => self.sorted = Some(self.finish_input()),
            }
        }

        Ok(self
            .sorted
            .as_mut()
            .and_then(VecDeque::pop_front)
            .map_or(GetNextResult::Eof, GetNextResult::Advanced))
    }

    fn constraints(&self) -> StageConstraints {
        StageConstraints {
            streaming: false,
            disk_use: DiskUseRequirement::WritesTmpData,
            ..StageConstraints::default()
        }
    }

    /// Folds a directly following `$limit` into this sort.
    fn optimize_at(&mut self, position: usize, container: &mut Vec<Box<dyn DocumentSource>>) {
        let Some(limit) = container
            .get(position)
            .and_then(|next| next.as_any().downcast_ref::<LimitStage>())
            .map(LimitStage::limit)
        else {
            return;
        };

        self.limit = Some(self.limit.map_or(limit, |current| current.min(limit)));
        container.remove(position);
    }

    fn serialize(&self) -> Result<Value, MergeError> {
        Ok(json!({ SORT_STAGE_NAME: self.spec.to_json() }))
    }

    fn serialize_to_array(&self) -> Result<Vec<Value>, MergeError> {
        let mut stages = vec![self.serialize()?];
        if let Some(limit) = self.limit {
            stages.push(LimitStage::new(limit).serialize()?);
        }
        Ok(stages)
    }

    fn dispose(&mut self) {
        self.pending.clear();
        self.sorted = Some(VecDeque::new());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
