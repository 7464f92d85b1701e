use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::sort::SortSpec;
use crate::engine::types::Document;

/// Frontier of the next unconsumed document of every remote with buffered
/// results, ordered by sort key and then by remote registration order.
#[derive(Debug)]
pub(crate) struct MergeQueue {
    spec: Arc<SortSpec>,
    heap: BinaryHeap<MergeEntry>,
}

impl MergeQueue {
    pub fn new(spec: Arc<SortSpec>) -> Self {
        Self {
            spec,
            heap: BinaryHeap::new(),
        }
    }

    pub fn spec(&self) -> &SortSpec {
        &self.spec
    }

    /// Registers `front` as the next document of `remote`. A remote must have
    /// at most one entry at a time.
    pub fn push(&mut self, remote: usize, front: &Document) {
        self.heap.push(MergeEntry {
            remote,
            key: self.spec.extract_key(front),
            spec: Arc::clone(&self.spec),
        });
    }

    /// Removes and returns the remote whose front document sorts first.
    pub fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|entry| entry.remote)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[derive(Debug)]
struct MergeEntry {
    remote: usize,
    key: Vec<Value>,
    spec: Arc<SortSpec>,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the least key pops first.
        self.spec
            .compare_keys(&self.key, &other.key)
            .then_with(|| self.remote.cmp(&other.remote))
            .reverse()
    }
}
