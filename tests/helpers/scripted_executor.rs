use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::engine::errors::DispatchError;
use crate::engine::executor::{CursorResponse, GetMoreRequest, KillCursorsRequest, TaskExecutor};
use crate::engine::types::{CursorId, Document, HostAndPort};

struct ScriptedReply {
    gate: Option<oneshot::Receiver<()>>,
    delay: Duration,
    result: Result<CursorResponse, DispatchError>,
}

/// Releases a reply registered with [`ScriptedExecutor::hold`].
pub struct ReleaseGate(oneshot::Sender<()>);

impl ReleaseGate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

/// A dispatch substrate answering getMores from per-cursor scripts and
/// recording every request it sees.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<(HostAndPort, CursorId), VecDeque<ScriptedReply>>>,
    get_more_calls: AtomicUsize,
    kill_calls: AtomicUsize,
    get_mores: Mutex<Vec<GetMoreRequest>>,
    killed: Mutex<Vec<(HostAndPort, CursorId)>>,
    fail_kills: AtomicBool,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, host: &str, cursor_id: u64, reply: ScriptedReply) {
        self.scripts
            .lock()
            .entry((HostAndPort::new(host), CursorId::new(cursor_id)))
            .or_default()
            .push_back(reply);
    }

    /// Queues a batch for `cursor_id`; `next_id` 0 closes the cursor.
    pub fn reply(&self, host: &str, cursor_id: u64, batch: Vec<Document>, next_id: u64) {
        self.reply_after(host, cursor_id, Duration::ZERO, batch, next_id);
    }

    pub fn reply_after(
        &self,
        host: &str,
        cursor_id: u64,
        delay: Duration,
        batch: Vec<Document>,
        next_id: u64,
    ) {
        self.push(
            host,
            cursor_id,
            ScriptedReply {
                gate: None,
                delay,
                result: Ok(CursorResponse::new(CursorId::new(next_id), batch)),
            },
        );
    }

    /// Queues a batch that is only delivered once the returned gate is
    /// released.
    pub fn hold(
        &self,
        host: &str,
        cursor_id: u64,
        batch: Vec<Document>,
        next_id: u64,
    ) -> ReleaseGate {
        let (tx, rx) = oneshot::channel();
        self.push(
            host,
            cursor_id,
            ScriptedReply {
                gate: Some(rx),
                delay: Duration::ZERO,
                result: Ok(CursorResponse::new(CursorId::new(next_id), batch)),
            },
        );
        ReleaseGate(tx)
    }

    pub fn fail(&self, host: &str, cursor_id: u64, error: DispatchError) {
        self.push(
            host,
            cursor_id,
            ScriptedReply {
                gate: None,
                delay: Duration::ZERO,
                result: Err(error),
            },
        );
    }

    pub fn fail_kills(&self) {
        self.fail_kills.store(true, Ordering::SeqCst);
    }

    pub fn get_more_calls(&self) -> usize {
        self.get_more_calls.load(Ordering::SeqCst)
    }

    pub fn kill_calls(&self) -> usize {
        self.kill_calls.load(Ordering::SeqCst)
    }

    pub fn get_mores(&self) -> Vec<GetMoreRequest> {
        self.get_mores.lock().clone()
    }

    pub fn killed(&self) -> Vec<(HostAndPort, CursorId)> {
        let mut killed = self.killed.lock().clone();
        killed.sort();
        killed
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn get_more(&self, request: GetMoreRequest) -> Result<CursorResponse, DispatchError> {
        self.get_more_calls.fetch_add(1, Ordering::SeqCst);
        self.get_mores.lock().push(request.clone());

        let reply = self
            .scripts
            .lock()
            .get_mut(&(request.host.clone(), request.cursor_id))
            .and_then(VecDeque::pop_front);

        let Some(reply) = reply else {
            return Err(DispatchError::CursorNotFound(request.cursor_id));
        };

        if let Some(gate) = reply.gate {
            if gate.await.is_err() {
                return Err(DispatchError::Canceled);
            }
        }
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }

    async fn kill_cursors(&self, request: KillCursorsRequest) -> Result<(), DispatchError> {
        self.kill_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_kills.load(Ordering::SeqCst) {
            return Err(DispatchError::HostUnreachable(request.host));
        }

        let mut killed = self.killed.lock();
        for cursor_id in request.cursor_ids {
            killed.push((request.host.clone(), cursor_id));
        }
        Ok(())
    }
}
