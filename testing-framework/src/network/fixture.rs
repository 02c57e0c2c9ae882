//! Snapshot-backed fixture cache
//!
//! A fixture is identified by the type of its function: every `fn` item and
//! closure has its own type, so two calls with the same fixture function
//! share one cache entry while different functions never collide.

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use tokenbench_devnet::core::blockchain::SnapshotId;

struct FixtureEntry {
    snapshot: SnapshotId,
    value: Box<dyn Any + Send + Sync>,
}

/// Results of fixtures already run, with the snapshot taken right after each
#[derive(Default)]
pub struct FixtureCache {
    entries: Mutex<HashMap<TypeId, FixtureEntry>>,
}

impl FixtureCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot recorded for the fixture `key`
    pub fn snapshot_of(&self, key: &TypeId) -> Option<SnapshotId> {
        self.entries.lock().get(key).map(|entry| entry.snapshot)
    }

    /// Cached value of the fixture `key`, if it has the expected type
    pub fn value_of<T: Clone + 'static>(&self, key: &TypeId) -> Option<T> {
        self.entries
            .lock()
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    /// Record a fixture result and its snapshot
    pub fn insert<T: Send + Sync + 'static>(&self, key: TypeId, snapshot: SnapshotId, value: T) {
        self.entries.lock().insert(
            key,
            FixtureEntry {
                snapshot,
                value: Box::new(value),
            },
        );
    }

    /// Replace the snapshot of `key` after it was consumed by a revert
    pub fn renew(&self, key: &TypeId, snapshot: SnapshotId) {
        if let Some(entry) = self.entries.lock().get_mut(key) {
            entry.snapshot = snapshot;
        }
    }

    /// Forget fixtures whose snapshot was taken after `snapshot`.
    ///
    /// Reverting consumes every later snapshot, so those fixtures have to run again.
    pub fn invalidate_after(&self, snapshot: SnapshotId) {
        self.entries
            .lock()
            .retain(|_, entry| entry.snapshot <= snapshot);
    }

    /// Forget fixtures whose snapshot is `snapshot` or a later one.
    ///
    /// Used after a plain revert to `snapshot`, which consumes that id too.
    pub fn invalidate_from(&self, snapshot: SnapshotId) {
        self.entries
            .lock()
            .retain(|_, entry| entry.snapshot < snapshot);
    }

    /// Forget a single fixture
    pub fn remove(&self, key: &TypeId) {
        self.entries.lock().remove(key);
    }

    /// Number of cached fixtures
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no fixture ran yet
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
