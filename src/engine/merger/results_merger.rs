use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, trace, warn};

use super::merge_queue::MergeQueue;
use super::params::MergeParams;
use super::remote::RemoteState;
use crate::engine::errors::{DispatchError, MergeError};
use crate::engine::executor::{
    CursorResponse, GetMoreRequest, KillCursorsHandle, KillCursorsRequest, OperationContext,
    TaskExecutor,
};
use crate::engine::sort::SortSpec;
use crate::engine::types::{Document, RemoteCursor};
use crate::shared::config::MergerConfig;

const LOG_TARGET: &str = "cursor_merge::merger";

/// Outcome of a single non-blocking pull.
#[derive(Debug, PartialEq)]
pub enum PullResult {
    Advanced(Document),
    /// A fetch the merge depends on is still outstanding; retry after
    /// [`RemoteStreamMerger::wait_for_event`] or a scheduler yield.
    NotReady,
    Exhausted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergerStats {
    pub fetches_scheduled: u64,
    pub batches_received: u64,
    pub documents_returned: u64,
    pub kills_scheduled: u64,
}

struct FetchCompletion {
    remote: usize,
    result: Result<CursorResponse, DispatchError>,
}

/// Delivers a fetch's outcome. A task dropped before sending (aborted, or
/// torn down with its runtime) reports `Canceled` instead of going silent.
struct CompletionSender {
    remote: usize,
    tx: Option<UnboundedSender<FetchCompletion>>,
}

impl CompletionSender {
    fn new(remote: usize, tx: UnboundedSender<FetchCompletion>) -> Self {
        Self {
            remote,
            tx: Some(tx),
        }
    }

    fn send(mut self, result: Result<CursorResponse, DispatchError>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<CursorResponse, DispatchError>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(FetchCompletion {
                remote: self.remote,
                result,
            });
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        self.deliver(Err(DispatchError::Canceled));
    }
}

/// Merges the result streams of several remote cursors into one.
///
/// Fetches run as tasks on the context's runtime and report back through a
/// channel; [`RemoteStreamMerger::pull`] only ever drains what has already
/// arrived, so the caller is never blocked on a slow remote. With a sort
/// spec the output is a k-way merge of the (individually sorted) remote
/// streams, otherwise documents are returned as soon as any remote has them.
///
/// The merger owns its remote cursors: disposing it, or dropping it without
/// disposing, kills every cursor that is not exhausted.
pub struct RemoteStreamMerger {
    ctx: Option<OperationContext>,
    runtime: Handle,
    executor: Arc<dyn TaskExecutor>,
    nss: String,
    batch_size: Option<u32>,
    prefetch: bool,
    remotes: Vec<RemoteState>,
    merge_queue: Option<MergeQueue>,
    current_remote: usize,
    completions_tx: UnboundedSender<FetchCompletion>,
    completions_rx: UnboundedReceiver<FetchCompletion>,
    stats: MergerStats,
    disposed: bool,
}

impl RemoteStreamMerger {
    /// Takes ownership of the remote cursors in `params`. No request is sent
    /// until the first pull.
    pub fn new(
        ctx: OperationContext,
        executor: Arc<dyn TaskExecutor>,
        params: MergeParams,
        config: &MergerConfig,
    ) -> Self {
        let MergeParams {
            nss,
            remotes,
            sort,
            batch_size,
        } = params;

        let remotes: Vec<RemoteState> = remotes.into_iter().map(RemoteState::from).collect();
        let mut merge_queue = sort.map(|spec| MergeQueue::new(Arc::new(spec)));
        if let Some(queue) = merge_queue.as_mut() {
            for (idx, remote) in remotes.iter().enumerate() {
                if let Some(front) = remote.buffer.front() {
                    queue.push(idx, front);
                }
            }
        }

        info!(
            target: LOG_TARGET,
            op_id = %ctx.op_id(),
            nss = %nss,
            remotes = remotes.len(),
            sorted = merge_queue.is_some(),
            "Merger took ownership of remote cursors"
        );

        let (completions_tx, completions_rx) = unbounded_channel();

        Self {
            runtime: ctx.runtime().clone(),
            ctx: Some(ctx),
            executor,
            nss,
            batch_size: batch_size.or(config.batch_size),
            prefetch: config.prefetch,
            remotes,
            merge_queue,
            current_remote: 0,
            completions_tx,
            completions_rx,
            stats: MergerStats::default(),
            disposed: false,
        }
    }

    pub fn nss(&self) -> &str {
        &self.nss
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.merge_queue.as_ref().map(MergeQueue::spec)
    }

    pub fn num_remotes(&self) -> usize {
        self.remotes.len()
    }

    pub fn stats(&self) -> MergerStats {
        self.stats
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_detached(&self) -> bool {
        self.ctx.is_none()
    }

    pub fn has_outstanding_fetches(&self) -> bool {
        self.remotes.iter().any(RemoteState::fetch_outstanding)
    }

    /// Whether the next pull can make progress without waiting on a fetch.
    pub fn ready(&self) -> bool {
        if self.remotes.iter().any(|remote| remote.error.is_some()) {
            return true;
        }

        if self.merge_queue.is_some() {
            // The remote order is unknown, so every live remote must have
            // something buffered before the least document can be picked.
            self.remotes
                .iter()
                .all(|remote| remote.has_buffered() || remote.is_exhausted())
        } else {
            self.remotes.iter().any(RemoteState::has_buffered)
                || self.remotes.iter().all(RemoteState::is_exhausted)
        }
    }

    /// Returns the next merged document without blocking.
    pub fn pull(&mut self) -> Result<PullResult, MergeError> {
        if self.disposed {
            return Err(MergeError::Disposed);
        }
        if self.ctx.is_none() {
            return Err(MergeError::Detached);
        }

        self.drain_completions();
        self.check_remote_errors()?;
        self.schedule_fetches();

        if !self.ready() {
            trace!(target: LOG_TARGET, nss = %self.nss, "Merger not ready");
            return Ok(PullResult::NotReady);
        }

        let next = if self.merge_queue.is_some() {
            self.next_sorted()
        } else {
            self.next_unsorted()
        };

        match next {
            Some((remote, doc)) => {
                self.stats.documents_returned += 1;
                if self.prefetch && self.remotes[remote].needs_fetch() {
                    self.schedule_get_more(remote);
                }
                Ok(PullResult::Advanced(doc))
            }
            None => {
                debug!(
                    target: LOG_TARGET,
                    nss = %self.nss,
                    returned = self.stats.documents_returned,
                    "All remote cursors exhausted"
                );
                Ok(PullResult::Exhausted)
            }
        }
    }

    /// Waits until an outstanding fetch completes and applies its result.
    /// Returns immediately when nothing is outstanding.
    pub async fn wait_for_event(&mut self) {
        if self.disposed || !self.has_outstanding_fetches() {
            return;
        }

        if let Some(completion) = self.completions_rx.recv().await {
            self.process_completion(completion);
        }
    }

    /// Pulls until a document is available or the merge is exhausted,
    /// waiting on fetch completions in between.
    pub async fn next_document(&mut self) -> Result<Option<Document>, MergeError> {
        loop {
            match self.pull()? {
                PullResult::Advanced(doc) => return Ok(Some(doc)),
                PullResult::Exhausted => return Ok(None),
                PullResult::NotReady => self.wait_for_event().await,
            }
        }
    }

    /// Disposes the merger: cancels outstanding fetches, discards buffered
    /// results and schedules a kill for every cursor that is not exhausted.
    ///
    /// Kills are best effort; failures are logged and never returned. Calling
    /// this again is a no-op.
    pub fn kill(&mut self) -> KillCursorsHandle {
        if self.disposed {
            return KillCursorsHandle::none();
        }
        self.disposed = true;

        let mut tasks = Vec::new();
        for remote in &mut self.remotes {
            remote.abort_fetch();
            remote.buffer.clear();
            if remote.is_exhausted() {
                continue;
            }

            let host = remote.host.clone();
            let cursor_id = remote.cursor_id;
            let request = KillCursorsRequest {
                host: host.clone(),
                nss: self.nss.clone(),
                cursor_ids: vec![cursor_id],
            };
            let executor = Arc::clone(&self.executor);
            tasks.push(self.runtime.spawn(async move {
                if let Err(error) = executor.kill_cursors(request).await {
                    warn!(
                        target: LOG_TARGET,
                        %host,
                        %cursor_id,
                        %error,
                        "Failed to kill remote cursor"
                    );
                }
            }));
        }

        if let Some(queue) = self.merge_queue.as_mut() {
            queue.clear();
        }
        self.stats.kills_scheduled += tasks.len() as u64;

        info!(
            target: LOG_TARGET,
            nss = %self.nss,
            kills = tasks.len(),
            returned = self.stats.documents_returned,
            "Merger disposed"
        );

        KillCursorsHandle::new(tasks)
    }

    /// Decouples the merger from its operation context. Buffered results and
    /// outstanding fetches are kept; pulls fail until reattached.
    pub fn detach_from_operation_context(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            debug!(target: LOG_TARGET, op_id = %ctx.op_id(), "Merger detached");
        }
    }

    pub fn reattach_to_operation_context(&mut self, ctx: OperationContext) {
        debug!(target: LOG_TARGET, op_id = %ctx.op_id(), "Merger reattached");
        self.runtime = ctx.runtime().clone();
        self.ctx = Some(ctx);
    }

    /// Current state of every remote, with still-buffered documents as the
    /// first batch.
    pub fn remotes_snapshot(&self) -> Vec<RemoteCursor> {
        self.remotes.iter().map(RemoteState::to_descriptor).collect()
    }

    /// Parameters equivalent to the merger's current state.
    pub fn params_snapshot(&self) -> MergeParams {
        MergeParams {
            nss: self.nss.clone(),
            remotes: self.remotes_snapshot(),
            sort: self.sort().cloned(),
            batch_size: self.batch_size,
        }
    }

    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.process_completion(completion);
        }
    }

    fn process_completion(&mut self, completion: FetchCompletion) {
        let FetchCompletion { remote, result } = completion;
        let Some(state) = self.remotes.get_mut(remote) else {
            return;
        };
        state.in_flight = None;

        match result {
            Ok(response) => {
                self.stats.batches_received += 1;
                debug!(
                    target: LOG_TARGET,
                    remote,
                    host = %state.host,
                    cursor_id = %response.cursor_id,
                    docs = response.next_batch.len(),
                    "Received batch"
                );

                let was_empty = state.buffer.is_empty();
                state.cursor_id = response.cursor_id;
                state.buffer.extend(response.next_batch);

                if was_empty {
                    if let (Some(queue), Some(front)) =
                        (self.merge_queue.as_mut(), state.buffer.front())
                    {
                        queue.push(remote, front);
                    }
                }
            }
            Err(error) => {
                warn!(
                    target: LOG_TARGET,
                    remote,
                    host = %state.host,
                    cursor_id = %state.cursor_id,
                    %error,
                    "Remote fetch failed"
                );
                state.error = Some(error);
            }
        }
    }

    fn check_remote_errors(&self) -> Result<(), MergeError> {
        let failed = self
            .remotes
            .iter()
            .find_map(|remote| remote.error.as_ref().map(|error| (remote, error)));

        match failed {
            Some((remote, error)) => Err(MergeError::RemoteFetch {
                host: remote.host.clone(),
                cursor_id: remote.cursor_id,
                reason: error.clone(),
            }),
            None => Ok(()),
        }
    }

    fn schedule_fetches(&mut self) {
        let lazy = !self.prefetch
            && self.merge_queue.is_none()
            && self.remotes.iter().any(RemoteState::has_buffered);
        if lazy {
            return;
        }

        for idx in 0..self.remotes.len() {
            if self.remotes[idx].needs_fetch() {
                self.schedule_get_more(idx);
            }
        }
    }

    fn schedule_get_more(&mut self, idx: usize) {
        let state = &mut self.remotes[idx];
        let request = GetMoreRequest {
            host: state.host.clone(),
            nss: self.nss.clone(),
            cursor_id: state.cursor_id,
            batch_size: self.batch_size,
        };

        trace!(
            target: LOG_TARGET,
            remote = idx,
            host = %request.host,
            cursor_id = %request.cursor_id,
            "Scheduling getMore"
        );

        let executor = Arc::clone(&self.executor);
        let completion = CompletionSender::new(idx, self.completions_tx.clone());
        state.in_flight = Some(self.runtime.spawn(async move {
            let result = executor.get_more(request).await;
            completion.send(result);
        }));
        self.stats.fetches_scheduled += 1;
    }

    fn next_sorted(&mut self) -> Option<(usize, Document)> {
        let queue = self.merge_queue.as_mut()?;
        let remote = queue.pop()?;
        let state = &mut self.remotes[remote];
        let doc = state.buffer.pop_front()?;
        if let Some(front) = state.buffer.front() {
            queue.push(remote, front);
        }
        Some((remote, doc))
    }

    fn next_unsorted(&mut self) -> Option<(usize, Document)> {
        let count = self.remotes.len();
        for step in 0..count {
            let idx = (self.current_remote + step) % count;
            if let Some(doc) = self.remotes[idx].buffer.pop_front() {
                self.current_remote = idx;
                return Some((idx, doc));
            }
        }
        None
    }
}

impl fmt::Debug for RemoteStreamMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStreamMerger")
            .field("nss", &self.nss)
            .field("remotes", &self.remotes.len())
            .field("sorted", &self.merge_queue.is_some())
            .field("detached", &self.ctx.is_none())
            .field("disposed", &self.disposed)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Drop for RemoteStreamMerger {
    fn drop(&mut self) {
        if !self.disposed {
            debug!(
                target: LOG_TARGET,
                nss = %self.nss,
                "Merger dropped without dispose, killing remote cursors"
            );
            let _ = self.kill();
        }
    }
}
