//! UnifiedStore: in-memory row store with BTreeMap and version management
//!
//! This module implements the Storage trait using:
//! - `BTreeMap<Key, Versioned<Document>>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the global commit version
//!
//! # Design Notes
//!
//! - **Latest value only**: each key stores its latest write. History lives
//!   in the ledger key space, where every version has its own key.
//! - **Batch writes only**: all mutation goes through `apply_batch`, called
//!   by the transaction manager with a freshly allocated commit version.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use ban_core::{BanResult, Document, Key, KeyPrefix, Storage, Versioned};

use crate::snapshot::ClonedSnapshotView;

/// Ordered map of stored rows
pub(crate) type RowMap = BTreeMap<Key, Versioned<Document>>;

/// Collect the rows under `prefix` visible at `max_version`
pub(crate) fn scan_rows(
    data: &RowMap,
    prefix: &KeyPrefix,
    max_version: u64,
) -> Vec<(Key, Versioned<Document>)> {
    data.range(prefix.start_key()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .filter(|(_, row)| row.version <= max_version)
        .map(|(k, row)| (k.clone(), row.clone()))
        .collect()
}

/// Unified storage backend using BTreeMap with RwLock
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
#[derive(Debug)]
pub struct UnifiedStore {
    /// The main data store: ordered map from Key to its latest versioned document
    data: Arc<RwLock<RowMap>>,
    /// Highest commit version applied so far
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            version: AtomicU64::new(0),
        }
    }

    /// Number of stored keys, across every key space
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if nothing was ever written
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Create a snapshot of the current state
    ///
    /// Deep clones the map. The snapshot is immutable: writes applied after
    /// this call are not visible through it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let snapshot = store.create_snapshot();
    /// store.apply_batch(&[(key.clone(), doc)], &[], 1)?;
    /// assert!(snapshot.get(&key)?.is_none());
    /// ```
    pub fn create_snapshot(&self) -> ClonedSnapshotView {
        // Read lock first: reading the version before taking the lock could
        // pair an older version with data from a newer batch.
        let data = self.data.read();
        let version = self.current_version();
        ClonedSnapshotView::new(version, data.clone())
    }
}

impl Default for UnifiedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &Key) -> BanResult<Option<Versioned<Document>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan_prefix(
        &self,
        prefix: &KeyPrefix,
        max_version: u64,
    ) -> BanResult<Vec<(Key, Versioned<Document>)>> {
        let data = self.data.read();
        Ok(scan_rows(&data, prefix, max_version))
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Apply a batch of writes and deletes atomically
    ///
    /// Holds the write lock for the whole batch, so no snapshot can see a
    /// partial transaction.
    ///
    /// # Arguments
    /// * `writes` - (key, document) pairs to write
    /// * `deletes` - keys to delete
    /// * `version` - commit version assigned to every write
    fn apply_batch(&self, writes: &[(Key, Document)], deletes: &[Key], version: u64) -> BanResult<()> {
        let mut data = self.data.write();

        for (key, doc) in writes {
            data.insert(key.clone(), Versioned::new(doc.clone(), version));
        }
        for key in deletes {
            data.remove(key);
        }

        // Versions are allocated under the commit lock but applied here;
        // fetch_max keeps current_version monotonic.
        self.version.fetch_max(version, Ordering::SeqCst);

        trace!(
            target: "ban::storage",
            version,
            writes = writes.len(),
            deletes = deletes.len(),
            "Batch applied"
        );
        Ok(())
    }
}
