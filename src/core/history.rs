// Bounded order book history
// Fixed-capacity FIFO window of snapshots shared between the feed and the worker

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::simulation::OrderBookSnapshot;

/// Thread-safe, fixed-capacity snapshot window.
///
/// Snapshots are stored as `Arc`s: readers copy a handle out under the lock and
/// never hold a reference into the deque itself.
#[derive(Debug)]
pub struct OrderBookHistory {
    inner: Mutex<HistoryInner>,
    capacity: usize,
}

#[derive(Debug)]
struct HistoryInner {
    snapshots: VecDeque<Arc<OrderBookSnapshot>>,
    total_appended: u64,
}

impl OrderBookHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(HistoryInner {
                snapshots: VecDeque::with_capacity(capacity),
                total_appended: 0,
            }),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest one first when full
    pub fn append(&self, snapshot: OrderBookSnapshot) -> Arc<OrderBookSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut inner = self.inner.lock();

        if inner.snapshots.len() >= self.capacity {
            inner.snapshots.pop_front();
        }
        inner.snapshots.push_back(Arc::clone(&snapshot));
        inner.total_appended += 1;

        snapshot
    }

    /// Most recently appended snapshot, `None` while empty
    pub fn latest(&self) -> Option<Arc<OrderBookSnapshot>> {
        self.inner.lock().snapshots.back().cloned()
    }

    /// Oldest retained snapshot
    pub fn oldest(&self) -> Option<Arc<OrderBookSnapshot>> {
        self.inner.lock().snapshots.front().cloned()
    }

    /// Copy out every retained snapshot, oldest first
    pub fn snapshots(&self) -> Vec<Arc<OrderBookSnapshot>> {
        self.inner.lock().snapshots.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots appended since creation, evicted ones included
    pub fn total_appended(&self) -> u64 {
        self.inner.lock().total_appended
    }
}
