use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::errors::MergeError;
use crate::engine::sort::SortSpec;
use crate::engine::types::RemoteCursor;

/// Everything needed to build a merger: the remote cursors, the namespace
/// they were opened on and, when the remote streams are already ordered, the
/// sort they are ordered by.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MergeParams {
    pub nss: String,
    #[serde(default)]
    pub remotes: Vec<RemoteCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

impl MergeParams {
    pub fn new(nss: impl Into<String>, remotes: Vec<RemoteCursor>) -> Self {
        Self {
            nss: nss.into(),
            remotes,
            sort: None,
            batch_size: None,
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.nss.trim().is_empty() {
            return Err(MergeError::InvalidSpec("nss must not be empty".to_string()));
        }

        if self.batch_size == Some(0) {
            return Err(MergeError::InvalidSpec(
                "batchSize must be positive".to_string(),
            ));
        }

        let mut live = HashSet::new();
        for remote in &self.remotes {
            if remote.host.is_empty() {
                return Err(MergeError::InvalidSpec(
                    "remote host must not be empty".to_string(),
                ));
            }
            if !remote.cursor_id.is_exhausted() && !live.insert((&remote.host, remote.cursor_id)) {
                return Err(MergeError::InvalidSpec(format!(
                    "cursor {} on {} listed more than once",
                    remote.cursor_id, remote.host
                )));
            }
        }

        Ok(())
    }
}
