//! Core traits for storage and snapshot abstraction
//!
//! This module defines the Storage and SnapshotView traits that let the
//! concurrency and engine layers run against any ordered, versioned row
//! store. The in-memory `UnifiedStore` is the shipped implementation; a
//! relational backend would implement the same two traits.

use crate::contract::Versioned;
use crate::error::BanResult;
use crate::types::{Key, KeyPrefix};
use crate::value::Document;

/// Storage abstraction for the row store
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Storage: Send + Sync {
    /// Get current value for key
    ///
    /// Returns None if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &Key) -> BanResult<Option<Versioned<Document>>>;

    /// Scan keys under a prefix, in key order
    ///
    /// Only values written at or before `max_version` are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn scan_prefix(
        &self,
        prefix: &KeyPrefix,
        max_version: u64,
    ) -> BanResult<Vec<(Key, Versioned<Document>)>>;

    /// Get current global commit version
    fn current_version(&self) -> u64;

    /// Apply the writes and deletes of one committed transaction
    ///
    /// All operations get `version`. Implementations must make the whole
    /// batch visible at once: a concurrent snapshot sees all of it or none
    /// of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn apply_batch(&self, writes: &[(Key, Document)], deletes: &[Key], version: u64)
        -> BanResult<()>;
}

/// Snapshot view abstraction for snapshot isolation
///
/// Provides an immutable point-in-time read view of storage.
///
/// Thread safety: Must be safe to pass between threads (Send + Sync).
pub trait SnapshotView: Send + Sync {
    /// Get value from snapshot
    ///
    /// Returns None if the key didn't exist when the snapshot was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &Key) -> BanResult<Option<Versioned<Document>>>;

    /// Scan keys under a prefix from snapshot, in key order
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn scan_prefix(&self, prefix: &KeyPrefix) -> BanResult<Vec<(Key, Versioned<Document>)>>;

    /// Get snapshot version
    fn version(&self) -> u64;
}
