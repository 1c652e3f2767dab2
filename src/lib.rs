//! BAN - versioned registry of postal addressing entities
//!
//! Municipalities, streets, localities, house numbers, positions, postal
//! codes and contacts, each with a full edit history: every versioned save
//! appends an immutable ledger entry holding the complete snapshot and the
//! field-level diff against the previous version.
//!
//! # Quick Start
//!
//! ```ignore
//! use ban::{Actor, Database, Municipality, Registry, VersionedEntity};
//!
//! let registry = Registry::new(Database::new());
//! let actor = Actor::new("alice");
//!
//! let mut town = Municipality::new("93031", "Épinay-sur-Seine");
//! registry.create(&actor, &mut town)?;
//!
//! town.name = "Épinay".into();
//! town.increment_version(&actor);
//! registry.persist_new_version(&actor, &mut town)?;
//!
//! let first = registry.versions::<Municipality>(town.id())?.get(0)?;
//! assert_eq!(first.load::<Municipality>()?.name, "Épinay-sur-Seine");
//! ```
//!
//! # Architecture
//!
//! `ban-core` (types, errors, CIA, diff) → `ban-storage` (ordered row store)
//! → `ban-concurrency` (optimistic transactions) → `ban-engine` (database,
//! ledger, entities, registry). This crate re-exports the public surface.

pub use ban_core::{
    compute_cia, is_official_fantoir, is_tmp_fantoir, is_uuid4, make_diff, street_code,
    tmp_fantoir, Actor, Audit, BanError, BanResult, Diff, EntityId, EntityKind, EntityRef,
    FieldChange, Fields, META_FIELDS,
};
pub use ban_engine::*;
