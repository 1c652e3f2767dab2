//! ClonedSnapshotView: snapshot implementation via deep clone
//!
//! Version-bounded, immutable view of storage used for transaction reads
//! and for the read paths (listing, history, reconstruction).
//!
//! # Design Notes
//!
//! - **Deep clone**: full BTreeMap copy at creation
//! - **Immutable**: once created, the snapshot never changes
//! - **Thread-safe**: data is Arc-wrapped, clones are cheap

use std::sync::Arc;

use ban_core::{BanResult, Document, Key, KeyPrefix, SnapshotView, Versioned};

use crate::unified::{scan_rows, RowMap};

/// A snapshot view that clones the entire BTreeMap
#[derive(Debug, Clone)]
pub struct ClonedSnapshotView {
    /// The version at which this snapshot was created
    version: u64,
    /// Deep clone of the storage data at snapshot time
    data: Arc<RowMap>,
}

impl ClonedSnapshotView {
    /// Create a new ClonedSnapshotView from existing data
    ///
    /// Typically called by `UnifiedStore::create_snapshot()`, not directly.
    pub(crate) fn new(version: u64, data: RowMap) -> Self {
        Self {
            version,
            data: Arc::new(data),
        }
    }

    /// Number of keys visible in this snapshot
    pub fn len(&self) -> usize {
        self.data
            .values()
            .filter(|row| row.version <= self.version)
            .count()
    }

    /// True if the snapshot holds no visible key
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotView for ClonedSnapshotView {
    fn get(&self, key: &Key) -> BanResult<Option<Versioned<Document>>> {
        Ok(self
            .data
            .get(key)
            .filter(|row| row.version <= self.version)
            .cloned())
    }

    fn scan_prefix(&self, prefix: &KeyPrefix) -> BanResult<Vec<(Key, Versioned<Document>)>> {
        Ok(scan_rows(&self.data, prefix, self.version))
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnifiedStore;
    use ban_core::{EntityId, EntityKind, KeySpace, Storage};
    use serde_json::json;

    #[test]
    fn test_snapshot_version_matches_store() {
        let store = UnifiedStore::new();
        store
            .apply_batch(&[(Key::row(EntityKind::Contact, EntityId::new()), json!({}))], &[], 3)
            .unwrap();

        let snapshot = store.create_snapshot();
        assert_eq!(snapshot.version(), 3);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = UnifiedStore::new().create_snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version(), 0);
    }

    #[test]
    fn test_snapshot_scan_isolated_from_deletes() {
        let store = UnifiedStore::new();
        let id = EntityId::new();
        let key = Key::ledger(EntityKind::Position, id, 1);
        store.apply_batch(&[(key.clone(), json!("v1"))], &[], 1).unwrap();

        let snapshot = store.create_snapshot();
        store.apply_batch(&[], &[key], 2).unwrap();

        let prefix = KeyPrefix::entity(EntityKind::Position, KeySpace::Ledger, id);
        assert_eq!(snapshot.scan_prefix(&prefix).unwrap().len(), 1);
        assert!(store.scan_prefix(&prefix, u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_clone_shares_data() {
        let store = UnifiedStore::new();
        let key = Key::row(EntityKind::Municipality, EntityId::new());
        store.apply_batch(&[(key.clone(), json!("x"))], &[], 1).unwrap();

        let a = store.create_snapshot();
        let b = a.clone();
        assert_eq!(a.get(&key).unwrap(), b.get(&key).unwrap());
    }
}
