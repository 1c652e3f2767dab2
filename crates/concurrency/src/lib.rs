//! Concurrency layer for the address registry
//!
//! This crate implements optimistic concurrency control (OCC) with:
//! - TransactionContext: read/write set tracking over a snapshot
//! - Conflict detection at commit time (first committer wins)
//! - Compare-and-swap (CAS) operations
//! - TransactionManager: commit lock and commit version allocation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::TransactionManager;
pub use transaction::{
    ApplyResult, CASOperation, CommitError, PendingOperations, TransactionContext,
    TransactionStatus,
};
pub use validation::{ConflictType, ValidationResult};
