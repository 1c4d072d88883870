//! Per-key build serialization
//!
//! Concurrent requests for the same item queue on one mutex so a single
//! build runs at a time for it. Unrelated items never contend. Lock entries
//! are removed once the last holder is done, so the map only holds items
//! currently being requested.

use dashmap::DashMap;
use parking_lot::Mutex;
use pitlane_core::AssetKind;
use std::sync::Arc;

/// Key identifying one buildable item
pub type FlightKey = (AssetKind, String);

/// Map of per-item mutexes
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<FlightKey, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`
    pub fn run<T>(&self, key: FlightKey, f: impl FnOnce() -> T) -> T {
        // The shard lock is held while cloning, which orders this against
        // the removal below
        let lock = self.locks.entry(key.clone()).or_default().clone();

        let result = {
            let _guard = lock.lock();
            f()
        };

        drop(lock);
        self.locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Number of items with a pending or running build
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
