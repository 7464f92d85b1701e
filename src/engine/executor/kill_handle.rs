use futures::future::join_all;
use tokio::task::JoinHandle;

/// Tracks the kill requests issued by a dispose.
///
/// Dropping the handle leaves the requests running in the background;
/// awaiting [`KillCursorsHandle::wait`] blocks until every request has
/// finished, successfully or not.
#[derive(Debug, Default)]
pub struct KillCursorsHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl KillCursorsHandle {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn new(tasks: Vec<JoinHandle<()>>) -> Self {
        Self { tasks }
    }

    /// Number of remote cursors a kill was scheduled for.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn wait(self) {
        join_all(self.tasks).await;
    }
}
