//! Core types and traits for the address registry
//!
//! This crate defines the foundational types used throughout the system:
//! - EntityId / EntityKind / EntityRef: entity identity
//! - Key / KeyPrefix / KeySpace: composite storage keys
//! - Document / Fields: stored representation of entity state
//! - BanError: error taxonomy
//! - Traits: storage abstraction (Storage, SnapshotView)
//! - CIA derivation and the field-level diff engine
//! - Actor / Audit: explicit audit context

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod cia;
pub mod contract;
pub mod diff;
pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use audit::{Actor, Audit};
pub use cia::{compute_cia, is_official_fantoir, is_tmp_fantoir, street_code, tmp_fantoir};
pub use contract::Versioned;
pub use diff::{make_diff, Diff, FieldChange, META_FIELDS};
pub use error::{BanError, BanResult};
pub use traits::{SnapshotView, Storage};
pub use types::{is_uuid4, EntityId, EntityKind, EntityRef, Key, KeyPrefix, KeySpace};
pub use value::{Document, Fields};
