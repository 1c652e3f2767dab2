//! Error types for the address registry
//!
//! This module defines the error taxonomy used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - `Validation`: an invariant was violated (duplicate number/ordinal,
//!   missing or deleted relation, malformed input). Expected and catchable.
//! - `Conflict`: a concurrent save won the race on the same entity. Distinct
//!   from `Validation` so callers can decide to retry.
//! - `NotFound`: a row, ledger sequence or related entity does not exist.
//! - Everything else (`Serialization`, `Storage`, ...) is fatal for the
//!   operation and propagates unchanged.

use crate::types::EntityRef;
use thiserror::Error;

/// Result type alias for registry operations
pub type BanResult<T> = std::result::Result<T, BanError>;

/// Error types for the address registry
#[derive(Debug, Error)]
pub enum BanError {
    /// Invariant violation detected before anything was written
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description of the violated invariant
        message: String,
    },

    /// A concurrent transaction committed first
    #[error("Conflict: {message}")]
    Conflict {
        /// What was being saved and what was observed
        message: String,
    },

    /// Entity, ledger entry or relation does not exist
    #[error("Not found: {entity}{}", detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    NotFound {
        /// The missing entity
        entity: EntityRef,
        /// Optional extra context (e.g. the missing sequence number)
        detail: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation attempted on a transaction that already finished
    #[error("Transaction not active: {state}")]
    TransactionNotActive {
        /// Debug rendering of the transaction status
        state: String,
    },
}

impl BanError {
    /// Build a `Validation` error
    pub fn validation(message: impl Into<String>) -> Self {
        BanError::Validation {
            message: message.into(),
        }
    }

    /// Build a `Conflict` error
    pub fn conflict(message: impl Into<String>) -> Self {
        BanError::Conflict {
            message: message.into(),
        }
    }

    /// Build a `NotFound` error for an entity
    pub fn not_found(entity: EntityRef) -> Self {
        BanError::NotFound {
            entity,
            detail: None,
        }
    }

    /// Build a `NotFound` error with extra detail
    pub fn not_found_with(entity: EntityRef, detail: impl Into<String>) -> Self {
        BanError::NotFound {
            entity,
            detail: Some(detail.into()),
        }
    }

    /// Build a `Serialization` error
    pub fn serialization(message: impl Into<String>) -> Self {
        BanError::Serialization(message.into())
    }

    /// Build a `Storage` error
    pub fn storage(message: impl Into<String>) -> Self {
        BanError::Storage(message.into())
    }

    /// Build an `InvalidOperation` error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        BanError::InvalidOperation(message.into())
    }

    /// True for invariant violations
    pub fn is_validation(&self) -> bool {
        matches!(self, BanError::Validation { .. })
    }

    /// True when a concurrent writer won; the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(self, BanError::Conflict { .. })
    }

    /// True when the requested entity or sequence does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, BanError::NotFound { .. })
    }
}

impl From<serde_json::Error> for BanError {
    fn from(e: serde_json::Error) -> Self {
        BanError::Serialization(e.to_string())
    }
}
