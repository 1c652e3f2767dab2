//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking
//! - Transaction metrics (started, committed, aborted)
//! - Commit rate calculation
//! - Conversion of commit failures into `BanError`

use std::sync::atomic::{AtomicU64, Ordering};

use ban_concurrency::{TransactionContext, TransactionManager};
use ban_core::{BanError, BanResult, SnapshotView, Storage};
use ban_storage::UnifiedStore;
use tracing::{debug, warn};

/// Transaction coordinator for the registry database
///
/// # Memory Ordering
///
/// The metric counters are observational only and use Relaxed ordering.
#[derive(Debug)]
pub struct TransactionCoordinator {
    /// Transaction manager for ID/version allocation and the commit protocol
    manager: TransactionManager,
    /// Active transaction count
    active_count: AtomicU64,
    /// Total transactions started
    total_started: AtomicU64,
    /// Total transactions committed
    total_committed: AtomicU64,
    /// Total transactions aborted
    total_aborted: AtomicU64,
}

impl TransactionCoordinator {
    /// Create new coordinator with initial version
    pub fn new(initial_version: u64) -> Self {
        Self {
            manager: TransactionManager::new(initial_version),
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Start a new transaction over a fresh snapshot of `storage`
    pub fn start_transaction(&self, storage: &UnifiedStore) -> TransactionContext {
        let txn_id = self.manager.next_txn_id();
        let snapshot = storage.create_snapshot();
        self.record_start();
        debug!(target: "ban::txn", txn_id, start_version = snapshot.version(), "Transaction started");
        TransactionContext::with_snapshot(txn_id, Box::new(snapshot))
    }

    /// Commit a transaction through the concurrency layer
    ///
    /// Records metrics and converts `CommitError` into `BanError`
    /// (validation conflicts become `Conflict`).
    pub fn commit<S: Storage + ?Sized>(
        &self,
        txn: &mut TransactionContext,
        store: &S,
    ) -> BanResult<u64> {
        match self.manager.commit(txn, store) {
            Ok(version) => {
                self.record_commit();
                debug!(target: "ban::txn", txn_id = txn.txn_id, version, "Transaction committed");
                Ok(version)
            }
            Err(e) => {
                self.record_abort();
                warn!(target: "ban::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(BanError::from(e))
            }
        }
    }

    /// Abort a transaction that never reached commit
    ///
    /// An already finished transaction only updates the metrics.
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) {
        if txn.can_rollback() {
            let _ = self.manager.abort(txn, reason.clone());
        }
        self.record_abort();
        warn!(target: "ban::txn", txn_id = txn.txn_id, reason = %reason, "Transaction aborted");
    }

    /// Record transaction start
    pub fn record_start(&self) {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transaction commit
    pub fn record_commit(&self) {
        self.decrement_active();
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transaction abort
    pub fn record_abort(&self) {
        self.decrement_active();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement_active(&self) {
        // Saturating: never underflow
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Get current active transaction count
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}

/// Transaction metrics
#[derive(Debug, Clone)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
