use crate::engine::types::{CursorId, Document, HostAndPort, RemoteCursor};

pub struct RemoteCursorFactory {
    host: String,
    cursor_id: u64,
    first_batch: Vec<Document>,
}

impl RemoteCursorFactory {
    pub fn new() -> Self {
        Self {
            host: "shard0:27017".to_string(),
            cursor_id: 1,
            first_batch: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_cursor_id(mut self, cursor_id: u64) -> Self {
        self.cursor_id = cursor_id;
        self
    }

    pub fn exhausted(mut self) -> Self {
        self.cursor_id = CursorId::EXHAUSTED.as_u64();
        self
    }

    pub fn with_first_batch(mut self, first_batch: Vec<Document>) -> Self {
        self.first_batch = first_batch;
        self
    }

    pub fn create(self) -> RemoteCursor {
        RemoteCursor {
            host: HostAndPort::new(self.host),
            cursor_id: CursorId::new(self.cursor_id),
            first_batch: self.first_batch,
        }
    }

    /// `count` live cursors on distinct hosts `shard0..shardN`, ids `1..=N`.
    pub fn create_many(count: usize) -> Vec<RemoteCursor> {
        (0..count)
            .map(|idx| {
                RemoteCursorFactory::new()
                    .with_host(&format!("shard{}:27017", idx))
                    .with_cursor_id(idx as u64 + 1)
                    .create()
            })
            .collect()
    }
}
