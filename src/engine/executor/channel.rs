use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tracing::debug;

use super::traits::{CursorResponse, GetMoreRequest, KillCursorsRequest, TaskExecutor};
use crate::engine::errors::DispatchError;
use crate::engine::types::HostAndPort;

const LOG_TARGET: &str = "cursor_merge::executor";

/// Request envelope delivered to a host worker; the worker answers through
/// the attached oneshot.
pub enum RemoteMessage {
    GetMore {
        request: GetMoreRequest,
        response: oneshot::Sender<Result<CursorResponse, DispatchError>>,
    },
    KillCursors {
        request: KillCursorsRequest,
        response: oneshot::Sender<Result<(), DispatchError>>,
    },
}

/// Dispatches remote requests over per-host message queues.
#[derive(Debug, Clone, Default)]
pub struct ChannelExecutor {
    routes: Arc<RwLock<HashMap<HostAndPort, Sender<RemoteMessage>>>>,
}

impl ChannelExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, host: HostAndPort, tx: Sender<RemoteMessage>) {
        debug!(target: LOG_TARGET, %host, "Registering host route");
        self.routes.write().insert(host, tx);
    }

    pub fn deregister(&self, host: &HostAndPort) -> bool {
        self.routes.write().remove(host).is_some()
    }

    fn route(&self, host: &HostAndPort) -> Result<Sender<RemoteMessage>, DispatchError> {
        self.routes
            .read()
            .get(host)
            .cloned()
            .ok_or_else(|| DispatchError::HostUnreachable(host.clone()))
    }
}

#[async_trait]
impl TaskExecutor for ChannelExecutor {
    async fn get_more(&self, request: GetMoreRequest) -> Result<CursorResponse, DispatchError> {
        let host = request.host.clone();
        let tx = self.route(&host)?;
        let (response_tx, response_rx) = oneshot::channel();

        debug!(
            target: LOG_TARGET,
            %host,
            cursor_id = %request.cursor_id,
            "Sending getMore"
        );

        tx.send(RemoteMessage::GetMore {
            request,
            response: response_tx,
        })
        .await
        .map_err(|_| DispatchError::HostUnreachable(host))?;

        response_rx.await.map_err(|_| DispatchError::Canceled)?
    }

    async fn kill_cursors(&self, request: KillCursorsRequest) -> Result<(), DispatchError> {
        let host = request.host.clone();
        let tx = self.route(&host)?;
        let (response_tx, response_rx) = oneshot::channel();

        debug!(
            target: LOG_TARGET,
            %host,
            cursors = request.cursor_ids.len(),
            "Sending killCursors"
        );

        tx.send(RemoteMessage::KillCursors {
            request,
            response: response_tx,
        })
        .await
        .map_err(|_| DispatchError::HostUnreachable(host))?;

        response_rx.await.map_err(|_| DispatchError::Canceled)?
    }
}
