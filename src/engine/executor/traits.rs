use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::errors::DispatchError;
use crate::engine::types::{CursorId, Document, HostAndPort};

/// Asks a remote host for the next batch of an open cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMoreRequest {
    pub host: HostAndPort,
    pub nss: String,
    pub cursor_id: CursorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

/// Asks a remote host to close cursors it still holds open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillCursorsRequest {
    pub host: HostAndPort,
    pub nss: String,
    pub cursor_ids: Vec<CursorId>,
}

/// One batch returned for a cursor. `cursor_id` is the id to use for the
/// next fetch, [`CursorId::EXHAUSTED`] once the remote has nothing left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorResponse {
    #[serde(rename = "id")]
    pub cursor_id: CursorId,
    #[serde(default)]
    pub next_batch: Vec<Document>,
}

impl CursorResponse {
    pub fn new(cursor_id: CursorId, next_batch: Vec<Document>) -> Self {
        Self {
            cursor_id,
            next_batch,
        }
    }

    pub fn last(next_batch: Vec<Document>) -> Self {
        Self::new(CursorId::EXHAUSTED, next_batch)
    }
}

/// Asynchronous request/response layer used to talk to remote hosts.
///
/// Implementations own transport, retries and timeouts. The merger only
/// schedules these calls and consumes their completions.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn get_more(&self, request: GetMoreRequest) -> Result<CursorResponse, DispatchError>;

    async fn kill_cursors(&self, request: KillCursorsRequest) -> Result<(), DispatchError>;
}
