//! Transaction validation for OCC
//!
//! Rules:
//! - First-committer-wins based on the READ set, not the write set
//! - Blind writes (write without read) do NOT conflict
//! - CAS is validated separately from the read set
//! - Read-only transactions always commit

use crate::transaction::{CASOperation, TransactionContext};
use ban_core::{BanError, BanResult, Key, Storage};
use std::collections::HashMap;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A key was read at one version but storage now holds another
    ReadWriteConflict {
        /// The key that has a conflict
        key: Key,
        /// Version recorded in read_set when read
        read_version: u64,
        /// Current version in storage at validation time
        current_version: u64,
    },

    /// A CAS expected a version that storage no longer holds
    CASConflict {
        /// The key that has a CAS conflict
        key: Key,
        /// Expected version specified in CAS operation
        expected_version: u64,
        /// Current version in storage at validation time
        current_version: u64,
    },
}

impl ConflictType {
    /// Key the conflict was detected on
    pub fn key(&self) -> &Key {
        match self {
            ConflictType::ReadWriteConflict { key, .. } | ConflictType::CASConflict { key, .. } => {
                key
            }
        }
    }
}

/// Result of transaction validation
///
/// A transaction commits only if `is_valid()` returns true.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// One-line description naming the conflicting keys
    pub fn describe(&self) -> String {
        let keys: Vec<String> = self.conflicts.iter().map(|c| c.key().to_string()).collect();
        if keys.is_empty() {
            "concurrent modification".to_string()
        } else {
            format!("concurrent modification of {}", keys.join(", "))
        }
    }
}

fn current_version_of<S: Storage + ?Sized>(store: &S, key: &Key) -> BanResult<u64> {
    store
        .get(key)
        .map(|found| found.map_or(0, |vv| vv.version))
        .map_err(|e| BanError::storage(format!("validation read of {} failed: {}", key, e)))
}

/// Validate the read set against current storage state
///
/// # Arguments
/// * `read_set` - Keys read with their versions at read time
/// * `store` - Storage to check current versions against
pub fn validate_read_set<S: Storage + ?Sized>(
    read_set: &HashMap<Key, u64>,
    store: &S,
) -> BanResult<ValidationResult> {
    let mut result = ValidationResult::ok();

    for (key, read_version) in read_set {
        let current_version = current_version_of(store, key)?;
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version: *read_version,
                current_version,
            });
        }
    }

    Ok(result)
}

/// Validate CAS operations against current storage state
///
/// `expected_version == 0` means "key must not exist".
pub fn validate_cas_set<S: Storage + ?Sized>(
    cas_set: &[CASOperation],
    store: &S,
) -> BanResult<ValidationResult> {
    let mut result = ValidationResult::ok();

    for cas_op in cas_set {
        let current_version = current_version_of(store, &cas_op.key)?;
        if current_version != cas_op.expected_version {
            result.conflicts.push(ConflictType::CASConflict {
                key: cas_op.key.clone(),
                expected_version: cas_op.expected_version,
                current_version,
            });
        }
    }

    Ok(result)
}

/// Validate a whole transaction
///
/// Read-only transactions skip validation: they only observed their
/// snapshot and write nothing.
pub fn validate_transaction<S: Storage + ?Sized>(
    txn: &TransactionContext,
    store: &S,
) -> BanResult<ValidationResult> {
    if txn.is_read_only() {
        return Ok(ValidationResult::ok());
    }

    let mut result = ValidationResult::ok();
    result.merge(validate_read_set(&txn.read_set, store)?);
    result.merge(validate_cas_set(&txn.cas_set, store)?);
    Ok(result)
}
