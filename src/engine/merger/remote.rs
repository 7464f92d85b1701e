use std::collections::VecDeque;

use tokio::task::JoinHandle;

use crate::engine::errors::DispatchError;
use crate::engine::types::{CursorId, Document, HostAndPort, RemoteCursor};

/// Fetch bookkeeping and pending results for one remote cursor.
#[derive(Debug)]
pub(crate) struct RemoteState {
    pub host: HostAndPort,
    pub cursor_id: CursorId,
    pub buffer: VecDeque<Document>,
    /// Task running the outstanding fetch, if any.
    pub in_flight: Option<JoinHandle<()>>,
    pub error: Option<DispatchError>,
}

impl RemoteState {
    pub fn has_buffered(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor_id.is_exhausted()
    }

    pub fn fetch_outstanding(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn needs_fetch(&self) -> bool {
        self.buffer.is_empty()
            && !self.is_exhausted()
            && !self.fetch_outstanding()
            && self.error.is_none()
    }

    pub fn abort_fetch(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    /// Describes this remote as it stands now: the current cursor id with
    /// whatever is still buffered as the first batch.
    pub fn to_descriptor(&self) -> RemoteCursor {
        RemoteCursor {
            host: self.host.clone(),
            cursor_id: self.cursor_id,
            first_batch: self.buffer.iter().cloned().collect(),
        }
    }
}

impl From<RemoteCursor> for RemoteState {
    fn from(remote: RemoteCursor) -> Self {
        Self {
            host: remote.host,
            cursor_id: remote.cursor_id,
            buffer: remote.first_batch.into(),
            in_flight: None,
            error: None,
        }
    }
}
