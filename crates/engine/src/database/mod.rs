//! Database struct and transaction API
//!
//! The Database owns the row store, the transaction coordinator and the
//! configuration. Everything the registry writes goes through one of its
//! two transaction APIs:
//!
//! 1. **Closure API** (recommended): `db.transaction(|txn| { ... })`
//!    - Automatic commit on success, abort on error
//!    - Returns the closure's return value
//!
//! 2. **Manual API**: `begin_transaction()` + `commit_transaction()`
//!    - For cases requiring external control over commit timing
//!
//! No transaction is ever retried automatically: a `Conflict` is returned
//! to the caller, who decides.

pub mod config;

pub use config::{BanConfig, ExportConfig, CONFIG_FILE_NAME};

use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use ban_concurrency::TransactionContext;
use ban_core::{BanError, BanResult, Storage};
use ban_storage::{ClonedSnapshotView, UnifiedStore};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Main database struct with transaction support
///
/// # Example
///
/// ```text
/// let db = Database::new();
/// let version = db.transaction(|txn| {
///     txn.put(key, doc)?;
///     Ok(())
/// })?;
/// ```
#[derive(Debug)]
pub struct Database {
    /// Ordered row store shared with snapshots
    storage: Arc<UnifiedStore>,
    /// Transaction lifecycle and commit protocol
    coordinator: TransactionCoordinator,
    /// Runtime configuration
    config: RwLock<BanConfig>,
}

impl Database {
    /// Create an empty in-memory database with the default configuration
    pub fn new() -> Arc<Self> {
        Self::with_config(BanConfig::default())
    }

    /// Create an empty in-memory database with the given configuration
    pub fn with_config(config: BanConfig) -> Arc<Self> {
        let storage = Arc::new(UnifiedStore::new());
        let coordinator = TransactionCoordinator::new(storage.current_version());
        info!(
            target: "ban::db",
            timeout_ms = config.transaction_timeout_ms,
            include_deleted = config.export.include_deleted,
            "Database created"
        );
        Arc::new(Self {
            storage,
            coordinator,
            config: RwLock::new(config),
        })
    }

    /// Create a database configured from `<dir>/ban.toml`
    ///
    /// The file is created with default content on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written, read or parsed.
    pub fn open<P: AsRef<Path>>(dir: P) -> BanResult<Arc<Self>> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        BanConfig::write_default_if_missing(&path)?;
        let config = BanConfig::from_file(&path)?;
        Ok(Self::with_config(config))
    }

    /// The underlying row store
    pub fn storage(&self) -> &Arc<UnifiedStore> {
        &self.storage
    }

    /// Immutable point-in-time view for read paths
    pub fn snapshot(&self) -> ClonedSnapshotView {
        self.storage.create_snapshot()
    }

    /// Current configuration (cloned)
    pub fn config(&self) -> BanConfig {
        self.config.read().clone()
    }

    /// Modify the configuration in place
    pub fn update_config<F: FnOnce(&mut BanConfig)>(&self, f: F) {
        f(&mut self.config.write());
    }

    /// Highest commit version applied to storage
    pub fn current_version(&self) -> u64 {
        self.storage.current_version()
    }

    /// Transaction statistics
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// Execute a transaction with the given closure
    ///
    /// - Creates a TransactionContext over a fresh snapshot
    /// - Executes the closure
    /// - Validates and commits on success, aborts on error
    ///
    /// # Returns
    /// * `Ok(T)` - Closure return value on successful commit
    /// * `Err` - Closure error, `Conflict` on a lost race, `InvalidOperation`
    ///   on timeout
    pub fn transaction<F, T>(&self, f: F) -> BanResult<T>
    where
        F: FnOnce(&mut TransactionContext) -> BanResult<T>,
    {
        let mut txn = self.begin_transaction();
        match f(&mut txn) {
            Ok(value) => {
                self.commit_transaction(&mut txn)?;
                Ok(value)
            }
            Err(e) => {
                self.abort_transaction(&mut txn, format!("Closure error: {}", e));
                Err(e)
            }
        }
    }

    /// Begin a new transaction (for manual control)
    ///
    /// Must be finished with `commit_transaction()` or `abort_transaction()`.
    pub fn begin_transaction(&self) -> TransactionContext {
        self.coordinator.start_transaction(&self.storage)
    }

    /// Commit a transaction
    ///
    /// # Returns
    /// The commit version assigned to all writes of the transaction.
    ///
    /// # Errors
    /// - `InvalidOperation` - the transaction outlived `transaction_timeout_ms`
    /// - `Conflict` - read-set or CAS validation failed
    /// - `TransactionNotActive` - the transaction already finished
    pub fn commit_transaction(&self, txn: &mut TransactionContext) -> BanResult<u64> {
        let timeout = self.config.read().transaction_timeout();
        if txn.is_active() && txn.is_expired(timeout) {
            let elapsed = txn.elapsed();
            self.coordinator
                .abort(txn, format!("timed out after {:?}", elapsed));
            return Err(BanError::invalid_operation(format!(
                "transaction {} exceeded timeout of {:?}",
                txn.txn_id, timeout
            )));
        }
        self.coordinator.commit(txn, self.storage.as_ref())
    }

    /// Abort a transaction, discarding its buffered operations
    pub fn abort_transaction(&self, txn: &mut TransactionContext, reason: String) {
        self.coordinator.abort(txn, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ban_core::{EntityId, EntityKind, Key};
    use serde_json::json;
    use tempfile::TempDir;

    fn key() -> Key {
        Key::row(EntityKind::Municipality, EntityId::new())
    }

    #[test]
    fn test_closure_commit_is_visible() {
        let db = Database::new();
        let k = key();
        db.transaction(|txn| txn.put(k.clone(), json!({"name": "Orvanne"})))
            .unwrap();

        let stored = db.storage().get(&k).unwrap().unwrap();
        assert_eq!(stored.value["name"], "Orvanne");
        assert_eq!(db.current_version(), 1);
    }

    #[test]
    fn test_closure_error_aborts_everything() {
        let db = Database::new();
        let k = key();
        let result: BanResult<()> = db.transaction(|txn| {
            txn.put(k.clone(), json!(1))?;
            Err(BanError::validation("nope"))
        });

        assert!(result.unwrap_err().is_validation());
        assert!(db.storage().get(&k).unwrap().is_none());
        assert_eq!(db.metrics().total_aborted, 1);
    }

    #[test]
    fn test_manual_api() {
        let db = Database::new();
        let k = key();
        let mut txn = db.begin_transaction();
        txn.put(k.clone(), json!("x")).unwrap();
        let version = db.commit_transaction(&mut txn).unwrap();
        assert_eq!(db.storage().get(&k).unwrap().unwrap().version, version);
    }

    #[test]
    fn test_expired_transaction_is_aborted() {
        let db = Database::with_config(BanConfig {
            transaction_timeout_ms: 1,
            ..BanConfig::default()
        });
        let k = key();
        let mut txn = db.begin_transaction();
        txn.put(k.clone(), json!("late")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));

        let err = db.commit_transaction(&mut txn).unwrap_err();
        assert!(matches!(err, BanError::InvalidOperation(_)));
        assert!(txn.is_aborted());
        assert!(db.storage().get(&k).unwrap().is_none());
    }

    #[test]
    fn test_open_creates_config_file() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(db.config(), BanConfig::default());
    }

    #[test]
    fn test_open_reads_existing_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[export]\ninclude_deleted = true\n",
        )
        .unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(db.config().export.include_deleted);
    }

    #[test]
    fn test_update_config() {
        let db = Database::new();
        db.update_config(|c| c.export.include_deleted = true);
        assert!(db.config().export.include_deleted);
    }
}
