//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. Commit version allocation
//! 3. Storage application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. take the commit lock
//! 2. txn.commit()        - Active → Validating → Committed | Aborted
//! 3. allocate_version()  - one version for the whole transaction
//! 4. txn.apply_writes()  - single batch under the storage write lock
//! 5. release the lock, return commit_version
//! ```
//!
//! The lock spans steps 2 to 4: no other transaction can commit between
//! validation and application, so two writers racing on the same base
//! version can never both pass validation.

use crate::{CommitError, TransactionContext, TransactionStatus};
use ban_core::{BanResult, Storage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

/// Manages transaction lifecycle and atomic commits
///
/// The global version counter is incremented once per committed
/// transaction; all keys in a transaction get the same commit version.
#[derive(Debug)]
pub struct TransactionManager {
    /// Global version counter
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Serializes validate + apply
    commit_lock: Mutex<()>,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// # Arguments
    /// * `initial_version` - Starting version (the store's current version)
    pub fn new(initial_version: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version (increment global version)
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Commit a transaction atomically
    ///
    /// Read-only transactions are marked committed without allocating a
    /// version; the current version is returned.
    ///
    /// # Returns
    /// - `Ok(commit_version)` on success
    /// - `Err(CommitError)` if validation fails or storage rejects the batch
    pub fn commit<S: Storage + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
    ) -> Result<u64, CommitError> {
        let _guard = self.commit_lock.lock();

        txn.commit(store)?;

        if txn.is_read_only() {
            return Ok(self.current_version());
        }

        let commit_version = self.allocate_version();
        if let Err(e) = txn.apply_writes(store, commit_version) {
            error!(
                target: "ban::txn",
                txn_id = txn.txn_id,
                commit_version,
                error = %e,
                "Storage application failed"
            );
            txn.status = TransactionStatus::Aborted {
                reason: format!("Storage application failed: {}", e),
            };
            return Err(CommitError::Storage(e.to_string()));
        }

        Ok(commit_version)
    }

    /// Explicitly abort a transaction
    ///
    /// All buffered operations are discarded.
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> BanResult<()> {
        txn.mark_aborted(reason)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
