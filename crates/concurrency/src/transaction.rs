//! Transaction context for OCC
//!
//! TransactionContext tracks all reads, writes, deletes and CAS operations
//! of one transaction so they can be validated and applied at commit time.
//!
//! Reads come from an immutable snapshot taken at begin. Writes are
//! buffered; nothing reaches storage before a successful commit, so an
//! aborted transaction leaves no visible effect.

use crate::validation::{validate_transaction, ValidationResult};
use ban_core::{BanError, BanResult, Document, Key, KeyPrefix, SnapshotView, Storage};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

/// Error type for commit failures
///
/// - All-or-nothing commit: the transaction either commits or aborts entirely
/// - First-committer-wins: conflicts are detected on the read set and CAS set
#[derive(Debug, Clone)]
pub enum CommitError {
    /// Transaction aborted due to validation conflicts
    ValidationFailed(ValidationResult),

    /// Transaction was not in correct state for commit
    InvalidState(String),

    /// Storage refused the batch
    Storage(String),
}

impl std::fmt::Display for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::ValidationFailed(result) => {
                write!(f, "Commit failed: {} conflict(s)", result.conflict_count())
            }
            CommitError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            CommitError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for CommitError {}

impl From<CommitError> for BanError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => BanError::conflict(result.describe()),
            CommitError::InvalidState(msg) => BanError::TransactionNotActive { state: msg },
            CommitError::Storage(msg) => BanError::storage(msg),
        }
    }
}

/// Result of applying transaction writes to storage
///
/// All keys in a transaction get the same commit version.
#[derive(Debug, Clone)]
pub struct ApplyResult {
    /// Version assigned to all writes in this transaction
    pub commit_version: u64,
    /// Number of puts applied
    pub puts_applied: usize,
    /// Number of deletes applied
    pub deletes_applied: usize,
    /// Number of CAS operations applied
    pub cas_applied: usize,
}

impl ApplyResult {
    /// Total number of operations applied
    pub fn total_operations(&self) -> usize {
        self.puts_applied + self.deletes_applied + self.cas_applied
    }
}

/// Summary of pending operations that would be rolled back on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Number of pending put operations
    pub puts: usize,
    /// Number of pending delete operations
    pub deletes: usize,
    /// Number of pending CAS operations
    pub cas: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes + self.cas
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (validation passed)
/// - `Validating` → `Aborted` (conflict detected)
/// - `Active` → `Aborted` (user abort or error)
///
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// A compare-and-swap operation to be validated at commit
///
/// At commit the key's current storage version must equal
/// `expected_version` (0 = key must not exist), otherwise the whole
/// transaction aborts.
///
/// CAS does NOT add to the read set. Read the key first if read-set
/// protection is wanted as well.
#[derive(Debug, Clone)]
pub struct CASOperation {
    /// Key to CAS
    pub key: Key,
    /// Expected version (0 = key must not exist)
    pub expected_version: u64,
    /// New document to write if version matches
    pub new_value: Document,
}

/// Transaction context for OCC with snapshot isolation
///
/// # Read-Your-Writes Semantics
///
/// When reading a key, the transaction checks in order:
/// 1. **cas_set** / **write_set**: uncommitted write from this transaction
/// 2. **delete_set**: None for an uncommitted delete
/// 3. **snapshot**: value from the snapshot, tracked in `read_set`
///
/// # Lifecycle
///
/// 1. **BEGIN**: `with_snapshot()`, status is `Active`
/// 2. **READ/WRITE**: `get()`, `put()`, `delete()`, `cas()`
/// 3. **COMMIT**: `commit()` validates, `apply_writes()` publishes
/// 4. **ABORT**: `mark_aborted()` discards buffered operations
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Version at transaction start (snapshot version)
    pub start_version: u64,

    snapshot: Box<dyn SnapshotView>,

    /// Keys read and the storage versions observed (0 = absent)
    pub read_set: HashMap<Key, u64>,

    /// Keys written with their new documents (buffered)
    pub write_set: HashMap<Key, Document>,

    /// Keys to delete (buffered)
    pub delete_set: HashSet<Key>,

    /// CAS operations to validate and apply
    pub cas_set: Vec<CASOperation>,

    /// Current transaction status
    pub status: TransactionStatus,

    start_time: Instant,
}

impl TransactionContext {
    /// Create a transaction reading from `snapshot`
    ///
    /// The start version is the snapshot's version.
    pub fn with_snapshot(txn_id: u64, snapshot: Box<dyn SnapshotView>) -> Self {
        TransactionContext {
            txn_id,
            start_version: snapshot.version(),
            snapshot,
            read_set: HashMap::new(),
            write_set: HashMap::new(),
            delete_set: HashSet::new(),
            cas_set: Vec::new(),
            status: TransactionStatus::Active,
            start_time: Instant::now(),
        }
    }

    // === Read Operations ===

    /// Read a key with read-your-writes semantics
    ///
    /// # Errors
    ///
    /// `TransactionNotActive` if the transaction already finished.
    pub fn get(&mut self, key: &Key) -> BanResult<Option<Document>> {
        self.ensure_active()?;

        if let Some(op) = self.cas_set.iter().rev().find(|op| &op.key == key) {
            return Ok(Some(op.new_value.clone()));
        }
        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.delete_set.contains(key) {
            return Ok(None);
        }

        Ok(self.get_versioned(key)?.map(|(doc, _)| doc))
    }

    /// Read a key from the snapshot together with its storage version
    ///
    /// Bypasses buffered writes. The observed version (0 when absent) is
    /// recorded in the read set and is the value to pass as
    /// `expected_version` to a later [`cas`](Self::cas).
    pub fn get_versioned(&mut self, key: &Key) -> BanResult<Option<(Document, u64)>> {
        self.ensure_active()?;

        match self.snapshot.get(key)? {
            Some(vv) => {
                self.read_set.insert(key.clone(), vv.version);
                Ok(Some((vv.value, vv.version)))
            }
            None => {
                // Absent keys are tracked too: a concurrent insert is a conflict
                self.read_set.insert(key.clone(), 0);
                Ok(None)
            }
        }
    }

    /// Check whether a key exists
    pub fn exists(&mut self, key: &Key) -> BanResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan a prefix with read-your-writes semantics, in key order
    ///
    /// Snapshot results are tracked in the read set. Keys deleted in this
    /// transaction are excluded, keys written in it are included.
    pub fn scan_prefix(&mut self, prefix: &KeyPrefix) -> BanResult<Vec<(Key, Document)>> {
        self.ensure_active()?;

        let mut results: BTreeMap<Key, Document> = BTreeMap::new();
        for (key, vv) in self.snapshot.scan_prefix(prefix)? {
            if !self.delete_set.contains(&key) {
                self.read_set.insert(key.clone(), vv.version);
                results.insert(key, vv.value);
            }
        }
        for (key, value) in &self.write_set {
            if key.starts_with(prefix) {
                results.insert(key.clone(), value.clone());
            }
        }
        for op in &self.cas_set {
            if op.key.starts_with(prefix) {
                results.insert(op.key.clone(), op.new_value.clone());
            }
        }

        Ok(results.into_iter().collect())
    }

    /// Version recorded for a key in the read set, if it was read
    pub fn get_read_version(&self, key: &Key) -> Option<u64> {
        self.read_set.get(key).copied()
    }

    // === Write Operations ===

    /// Buffer a write
    pub fn put(&mut self, key: Key, value: Document) -> BanResult<()> {
        self.ensure_active()?;
        self.delete_set.remove(&key);
        self.write_set.insert(key, value);
        Ok(())
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: Key) -> BanResult<()> {
        self.ensure_active()?;
        self.write_set.remove(&key);
        self.delete_set.insert(key);
        Ok(())
    }

    /// Buffer a compare-and-swap
    ///
    /// Validated at commit against the current storage version of `key`.
    pub fn cas(&mut self, key: Key, expected_version: u64, new_value: Document) -> BanResult<()> {
        self.ensure_active()?;
        self.cas_set.push(CASOperation {
            key,
            expected_version,
            new_value,
        });
        Ok(())
    }

    // === State Management ===

    /// True while operations are accepted
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// True once the commit succeeded
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// True once the transaction was aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// True when the transaction buffered no write of any kind
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty() && self.delete_set.is_empty() && self.cas_set.is_empty()
    }

    /// True if an abort is still possible
    pub fn can_rollback(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Validating
        )
    }

    /// Check if the transaction has been running longer than `timeout`
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.start_time.elapsed() > timeout
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Fail with `TransactionNotActive` unless the status is `Active`
    pub fn ensure_active(&self) -> BanResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(BanError::TransactionNotActive {
                state: format!("transaction {} is {:?}", self.txn_id, self.status),
            })
        }
    }

    /// Abort the transaction, discarding all buffered operations
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the transaction already committed or aborted.
    pub fn mark_aborted(&mut self, reason: String) -> BanResult<()> {
        match &self.status {
            TransactionStatus::Committed => Err(BanError::invalid_operation(format!(
                "Cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(BanError::invalid_operation(format!(
                "Transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted { reason };
                self.write_set.clear();
                self.delete_set.clear();
                self.cas_set.clear();
                Ok(())
            }
        }
    }

    /// Summary of what an abort would discard
    pub fn pending_operations(&self) -> PendingOperations {
        PendingOperations {
            puts: self.write_set.len(),
            deletes: self.delete_set.len(),
            cas: self.cas_set.len(),
        }
    }

    // === Commit Operation ===

    /// Validate against current storage and move to `Committed`
    ///
    /// Must run under the manager's commit lock so that nothing commits
    /// between validation and `apply_writes`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the transaction is not `Active`
    /// - `ValidationFailed` on any read-set or CAS conflict (status becomes `Aborted`)
    pub fn commit<S: Storage + ?Sized>(&mut self, store: &S) -> Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "Cannot commit transaction {} from {:?} state - must be Active",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;

        let validation = match validate_transaction(self, store) {
            Ok(v) => v,
            Err(e) => {
                self.status = TransactionStatus::Aborted {
                    reason: format!("Validation error: {}", e),
                };
                return Err(CommitError::Storage(e.to_string()));
            }
        };

        if !validation.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: format!(
                    "Commit failed: {} conflict(s) detected",
                    validation.conflict_count()
                ),
            };
            return Err(CommitError::ValidationFailed(validation));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Apply buffered operations to storage as one batch
    ///
    /// CAS operations were validated in `commit()` and are applied as puts.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` unless the transaction is `Committed`; storage
    /// errors propagate.
    pub fn apply_writes<S: Storage + ?Sized>(
        &self,
        store: &S,
        commit_version: u64,
    ) -> BanResult<ApplyResult> {
        if !self.is_committed() {
            return Err(BanError::invalid_operation(format!(
                "Cannot apply writes: transaction {} is {:?}, must be Committed",
                self.txn_id, self.status
            )));
        }

        let mut writes: Vec<(Key, Document)> = self
            .write_set
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        writes.extend(
            self.cas_set
                .iter()
                .map(|op| (op.key.clone(), op.new_value.clone())),
        );
        let deletes: Vec<Key> = self.delete_set.iter().cloned().collect();

        store.apply_batch(&writes, &deletes, commit_version)?;

        Ok(ApplyResult {
            commit_version,
            puts_applied: self.write_set.len(),
            deletes_applied: deletes.len(),
            cas_applied: self.cas_set.len(),
        })
    }

    // === Introspection ===

    /// Number of keys in the read set
    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Number of buffered writes, CAS included
    pub fn write_count(&self) -> usize {
        self.write_set.len() + self.cas_set.len()
    }
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("status", &self.status)
            .field("reads", &self.read_set.len())
            .field("pending", &self.pending_operations())
            .finish()
    }
}
