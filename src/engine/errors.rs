use thiserror::Error;
use tracing::{debug, error};

use crate::engine::types::{CursorId, HostAndPort};

/// Errors surfaced by the merge engine and the `$mergeCursors` stage.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("error on remote cursor {cursor_id} on host {host}: {reason}")]
    RemoteFetch {
        host: HostAndPort,
        cursor_id: CursorId,
        reason: DispatchError,
    },

    #[error("merge cursors used after dispose")]
    Disposed,

    #[error("merge cursors used while detached from its operation context")]
    Detached,

    #[error("remote cursors were forwarded to another host")]
    Transferred,

    #[error("{0} must be serialized with serialize_to_array")]
    SerializeMisuse(&'static str),

    #[error("cursor ownership invariant violated: {0}")]
    OwnershipInvariant(&'static str),

    #[error("invalid $mergeCursors spec: {0}")]
    InvalidSpec(String),

    #[error("invalid sort pattern: {0}")]
    InvalidSort(String),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("no tokio runtime available for remote dispatch")]
    NoRuntime,

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl MergeError {
    /// Misuse errors are programming defects rather than runtime conditions.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            MergeError::Disposed
                | MergeError::Detached
                | MergeError::Transferred
                | MergeError::SerializeMisuse(_)
                | MergeError::OwnershipInvariant(_)
        )
    }

    pub fn log_error(&self) {
        match self {
            MergeError::RemoteFetch {
                host,
                cursor_id,
                reason,
            } => {
                error!(target: "cursor_merge::error", %host, %cursor_id, "Remote fetch failed: {}", reason);
                debug!(target: "cursor_merge::error", "Remote fetch error details: {:?}", reason);
            }
            other if other.is_misuse() => {
                error!(target: "cursor_merge::error", "Merge cursors misuse: {}", other);
            }
            other => {
                error!(target: "cursor_merge::error", "Merge cursors error: {}", other);
                debug!(target: "cursor_merge::error", "Merge cursors error details: {:?}", other);
            }
        }
    }
}

/// Errors reported by a dispatch substrate for a single remote request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("host {0} is unreachable")]
    HostUnreachable(HostAndPort),

    #[error("cursor {0} not found")]
    CursorNotFound(CursorId),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("request canceled")]
    Canceled,
}
