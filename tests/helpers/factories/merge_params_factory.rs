use serde_json::Value;

use crate::engine::merger::MergeParams;
use crate::engine::sort::SortSpec;
use crate::engine::types::RemoteCursor;

pub struct MergeParamsFactory {
    nss: String,
    remotes: Vec<RemoteCursor>,
    sort: Option<Value>,
    batch_size: Option<u32>,
}

impl MergeParamsFactory {
    pub fn new() -> Self {
        Self {
            nss: "test.events".to_string(),
            remotes: Vec::new(),
            sort: None,
            batch_size: None,
        }
    }

    pub fn with_nss(mut self, nss: &str) -> Self {
        self.nss = nss.to_string();
        self
    }

    pub fn with_remote(mut self, remote: RemoteCursor) -> Self {
        self.remotes.push(remote);
        self
    }

    pub fn with_remotes(mut self, remotes: Vec<RemoteCursor>) -> Self {
        self.remotes.extend(remotes);
        self
    }

    pub fn with_sort(mut self, pattern: Value) -> Self {
        self.sort = Some(pattern);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn create(self) -> MergeParams {
        let mut params = MergeParams::new(self.nss, self.remotes);
        if let Some(pattern) = self.sort {
            params.sort = Some(SortSpec::from_json(&pattern).expect("valid sort pattern"));
        }
        params.batch_size = self.batch_size;
        params
    }
}
