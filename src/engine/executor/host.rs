use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{Receiver, Sender, channel};
use tracing::{debug, info};

use super::channel::RemoteMessage;
use super::traits::{CursorResponse, GetMoreRequest, KillCursorsRequest};
use crate::engine::errors::DispatchError;
use crate::engine::types::{CursorId, Document, HostAndPort, RemoteCursor};

const LOG_TARGET: &str = "cursor_merge::host";

#[derive(Debug)]
struct OpenCursor {
    nss: String,
    remaining: VecDeque<Document>,
}

#[derive(Debug, Default)]
struct CursorTable {
    next_id: u64,
    open: HashMap<CursorId, OpenCursor>,
    killed: Vec<CursorId>,
}

/// An in-process remote host serving cursors from memory.
///
/// Each host runs a worker task answering [`RemoteMessage`]s; register its
/// sender with a [`super::ChannelExecutor`] to route requests to it.
#[derive(Debug, Clone)]
pub struct CursorHost {
    host: HostAndPort,
    tx: Sender<RemoteMessage>,
    cursors: Arc<Mutex<CursorTable>>,
}

impl CursorHost {
    /// Spawns the host worker on the current tokio runtime.
    pub fn spawn(host: impl Into<String>, batch_size: usize) -> Self {
        let host = HostAndPort::new(host);
        let (tx, rx) = channel(1024);
        let cursors = Arc::new(Mutex::new(CursorTable {
            next_id: 1,
            ..CursorTable::default()
        }));

        let worker_host = host.clone();
        let worker_cursors = Arc::clone(&cursors);
        let batch_size = batch_size.max(1);
        tokio::spawn(async move {
            run_host_loop(worker_host, worker_cursors, rx, batch_size).await;
        });

        info!(target: LOG_TARGET, %host, "Cursor host started");
        Self { host, tx, cursors }
    }

    pub fn host(&self) -> &HostAndPort {
        &self.host
    }

    pub fn sender(&self) -> Sender<RemoteMessage> {
        self.tx.clone()
    }

    /// Opens a cursor over `docs`, returning the descriptor with the first
    /// `first_batch_size` documents attached. A cursor whose documents all
    /// fit in the first batch is returned already exhausted.
    pub fn open_cursor(
        &self,
        nss: impl Into<String>,
        docs: Vec<Document>,
        first_batch_size: usize,
    ) -> RemoteCursor {
        let mut remaining: VecDeque<Document> = docs.into();
        let split = first_batch_size.min(remaining.len());
        let first_batch: Vec<Document> = remaining.drain(..split).collect();

        if remaining.is_empty() {
            return RemoteCursor {
                host: self.host.clone(),
                cursor_id: CursorId::EXHAUSTED,
                first_batch,
            };
        }

        let mut table = self.cursors.lock();
        let cursor_id = CursorId::new(table.next_id);
        table.next_id += 1;
        table.open.insert(
            cursor_id,
            OpenCursor {
                nss: nss.into(),
                remaining,
            },
        );

        RemoteCursor {
            host: self.host.clone(),
            cursor_id,
            first_batch,
        }
    }

    pub fn is_open(&self, cursor_id: CursorId) -> bool {
        self.cursors.lock().open.contains_key(&cursor_id)
    }

    pub fn open_cursor_count(&self) -> usize {
        self.cursors.lock().open.len()
    }

    /// Cursors closed through `killCursors`, in the order they were killed.
    pub fn killed_cursors(&self) -> Vec<CursorId> {
        self.cursors.lock().killed.clone()
    }

    /// Drops a cursor as if it had timed out on the remote side.
    pub fn expire_cursor(&self, cursor_id: CursorId) -> bool {
        self.cursors.lock().open.remove(&cursor_id).is_some()
    }
}

async fn run_host_loop(
    host: HostAndPort,
    cursors: Arc<Mutex<CursorTable>>,
    mut rx: Receiver<RemoteMessage>,
    default_batch_size: usize,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            RemoteMessage::GetMore { request, response } => {
                debug!(target: LOG_TARGET, %host, cursor_id = %request.cursor_id, "Received getMore");
                let result = on_get_more(&cursors, request, default_batch_size);
                let _ = response.send(result);
            }
            RemoteMessage::KillCursors { request, response } => {
                debug!(target: LOG_TARGET, %host, cursors = request.cursor_ids.len(), "Received killCursors");
                on_kill_cursors(&cursors, request);
                let _ = response.send(Ok(()));
            }
        }
    }

    info!(target: LOG_TARGET, %host, "Cursor host shutting down");
}

fn on_get_more(
    cursors: &Mutex<CursorTable>,
    request: GetMoreRequest,
    default_batch_size: usize,
) -> Result<CursorResponse, DispatchError> {
    let mut table = cursors.lock();
    let cursor = table
        .open
        .get_mut(&request.cursor_id)
        .ok_or(DispatchError::CursorNotFound(request.cursor_id))?;

    if cursor.nss != request.nss {
        return Err(DispatchError::Remote(format!(
            "cursor {} belongs to {}, not {}",
            request.cursor_id, cursor.nss, request.nss
        )));
    }

    let batch_size = request
        .batch_size
        .map(|size| size as usize)
        .filter(|size| *size > 0)
        .unwrap_or(default_batch_size);
    let take = batch_size.min(cursor.remaining.len());
    let batch: Vec<Document> = cursor.remaining.drain(..take).collect();

    if cursor.remaining.is_empty() {
        table.open.remove(&request.cursor_id);
        return Ok(CursorResponse::last(batch));
    }

    Ok(CursorResponse::new(request.cursor_id, batch))
}

fn on_kill_cursors(cursors: &Mutex<CursorTable>, request: KillCursorsRequest) {
    let mut table = cursors.lock();
    for cursor_id in request.cursor_ids {
        if table.open.remove(&cursor_id).is_some() {
            table.killed.push(cursor_id);
        }
    }
}
