//! In-process lock table keyed by document.
//!
//! Serialises same-process callers that read a document's payment sums and
//! then write against it. Database row locks still guard against other
//! processes; this table keeps same-process callers from queueing on
//! pooled connections while they wait.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::types::DocumentKey;

type LockTable = DashMap<DocumentKey, Arc<Mutex<()>>>;

/// Per-document async mutexes, created on demand and pruned when idle.
#[derive(Debug, Clone, Default)]
pub struct DocumentLocks {
    table: Arc<LockTable>,
}

impl DocumentLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// Dropping the future while it waits still prunes the entry.
    pub async fn lock(&self, key: DocumentKey) -> DocumentGuard {
        // Declared before the wait so it drops after the waiter's mutex handle.
        let prune = Prune {
            key,
            table: Arc::clone(&self.table),
        };
        let mutex = self.table.entry(key).or_default().clone();
        let guard = mutex.lock_owned().await;
        DocumentGuard { guard, prune }
    }

    /// Locks several documents in key order.
    ///
    /// Duplicates are collapsed so a caller never waits on itself.
    pub async fn lock_many(
        &self,
        keys: impl IntoIterator<Item = DocumentKey>,
    ) -> Vec<DocumentGuard> {
        let mut keys: Vec<_> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of documents with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no document is locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Removes a document's entry once nobody holds or awaits it.
#[derive(Debug)]
struct Prune {
    key: DocumentKey,
    table: Arc<LockTable>,
}

impl Drop for Prune {
    fn drop(&mut self) {
        // Only the table's own reference left.
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive access to one document; released on drop.
#[derive(Debug)]
pub struct DocumentGuard {
    // Field order matters: the mutex is released before the prune check.
    guard: OwnedMutexGuard<()>,
    prune: Prune,
}

impl DocumentGuard {
    /// The locked document.
    #[must_use]
    pub fn key(&self) -> DocumentKey {
        self.prune.key
    }
}
