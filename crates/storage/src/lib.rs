//! Storage layer for the address registry
//!
//! This crate implements the in-memory row store:
//! - UnifiedStore: BTreeMap-based storage with RwLock
//! - Version management with AtomicU64
//! - ClonedSnapshotView implementation
//!
//! Entity rows, ledger entries and uniqueness claims all live in the same
//! ordered map, distinguished by their key space. A transaction's writes
//! across the three are applied as one batch under one write lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod unified;

pub use snapshot::ClonedSnapshotView;
pub use unified::UnifiedStore;
