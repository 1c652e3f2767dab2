//! Versioned entities
//!
//! Every registry entity is a plain serde struct that flattens an
//! [`EntityMeta`] (identity, version, soft-delete flag, audit fields) next
//! to its business attributes. The [`VersionedEntity`] trait is the
//! compile-time contract the registry and the ledger work against:
//!
//! - `fields()` is the flattened attribute set snapshotted by the ledger
//! - `relations()` lists the rows that must be live at save time
//! - `unique_claim()` names the scoped uniqueness slot the entity occupies
//! - `prepare()` recomputes derived fields inside the saving transaction
//! - `as_export()` is the stable view handed to export collaborators

pub mod contact;
pub mod housenumber;
pub mod locality;
pub mod municipality;
pub mod position;
pub mod postcode;
pub mod street;

pub use contact::Contact;
pub use housenumber::HouseNumber;
pub use locality::Locality;
pub use municipality::Municipality;
pub use position::Position;
pub use postcode::PostCode;
pub use street::Street;

use crate::view::RegistryView;
use ban_concurrency::TransactionContext;
use ban_core::value::to_fields;
use ban_core::{cia, Actor, Audit, BanError, BanResult, EntityId, EntityKind, EntityRef, Fields};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identity, version and audit state shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Primary identifier
    pub id: EntityId,
    /// Version of the last persisted state, 0 before creation
    #[serde(default)]
    pub version: u64,
    /// Target version set by `increment_version`, never persisted
    #[serde(skip)]
    pending_version: Option<u64>,
    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
    /// Audit fields
    #[serde(flatten)]
    pub audit: Audit,
}

impl EntityMeta {
    /// Metadata of a new, never persisted entity
    pub fn new() -> Self {
        Self::with_id(EntityId::new())
    }

    /// Metadata of a new entity with a caller-chosen id
    pub fn with_id(id: EntityId) -> Self {
        Self {
            id,
            version: 0,
            pending_version: None,
            deleted: false,
            audit: Audit::unsaved(),
        }
    }

    /// Version the next `persist_new_version` will write
    pub fn pending_version(&self) -> Option<u64> {
        self.pending_version
    }

    pub(crate) fn set_persisted_version(&mut self, version: u64) {
        self.version = version;
        self.pending_version = None;
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract implemented by every registry entity
pub trait VersionedEntity:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Table this entity lives in
    const KIND: EntityKind;

    /// Shared metadata
    fn meta(&self) -> &EntityMeta;

    /// Shared metadata, mutable
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Rows that must exist and be live whenever this entity is saved
    fn relations(&self) -> Vec<EntityRef> {
        Vec::new()
    }

    /// Uniqueness slot: `(scope, claim)`, unique among live entities of
    /// the same kind sharing `scope`
    fn unique_claim(&self) -> Option<(EntityId, String)> {
        None
    }

    /// Check business attributes before any storage access
    fn validate(&self) -> BanResult<()> {
        Ok(())
    }

    /// Recompute derived fields inside the saving transaction
    ///
    /// Runs after relations were checked.
    fn prepare(&mut self, _txn: &mut TransactionContext) -> BanResult<()> {
        Ok(())
    }

    /// Export view with stable field names
    ///
    /// Relations are resolved against `view`.
    fn as_export(&self, view: &RegistryView) -> BanResult<Fields>;

    /// Primary identifier
    fn id(&self) -> EntityId {
        self.meta().id
    }

    /// Version of the last persisted state
    fn version(&self) -> u64 {
        self.meta().version
    }

    /// Version the next versioned save will write, if requested
    fn pending_version(&self) -> Option<u64> {
        self.meta().pending_version
    }

    /// Soft-delete flag
    fn is_deleted(&self) -> bool {
        self.meta().deleted
    }

    /// Typed reference to this entity
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id())
    }

    /// Request a new version on the next save
    ///
    /// In-memory only. The pending version is always `version + 1`, so
    /// calling this twice before saving still produces a single entry.
    fn increment_version(&mut self, actor: &Actor) {
        let meta = self.meta_mut();
        meta.pending_version = Some(meta.version + 1);
        meta.audit.modified_by = Some(actor.clone());
    }

    /// Flattened attribute set, as snapshotted by the ledger
    fn fields(&self) -> BanResult<Fields> {
        to_fields(self)
    }
}

/// Start an export map with the fields every entity exports
pub(crate) fn export_base<E: VersionedEntity>(entity: &E) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), serde_json::json!(entity.id()));
    fields.insert("version".to_string(), serde_json::json!(entity.version()));
    fields
}

/// Reject official codes outside the FANTOIR alphabet
///
/// An absent or blank code is fine: the placeholder is used instead.
pub(crate) fn validate_fantoir(fantoir: Option<&str>) -> BanResult<()> {
    match fantoir.map(str::trim) {
        Some(code) if !code.is_empty() && !cia::is_official_fantoir(code) => Err(
            BanError::validation(format!("invalid FANTOIR code '{}'", code)),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_version_is_a_counter() {
        let mut contact = Contact::new("Jeanne", "jeanne@example.org");
        contact.meta.version = 3;

        contact.increment_version(&Actor::new("bob"));
        contact.increment_version(&Actor::new("bob"));

        assert_eq!(contact.pending_version(), Some(4));
        assert_eq!(contact.version(), 3);
        assert_eq!(
            contact.meta.audit.modified_by.as_ref().map(Actor::as_str),
            Some("bob")
        );
    }

    #[test]
    fn test_pending_version_is_not_serialized() {
        let mut contact = Contact::new("Jeanne", "jeanne@example.org");
        contact.increment_version(&Actor::system());

        let fields = contact.fields().unwrap();
        assert!(!fields.contains_key("pending_version"));
        assert_eq!(fields["version"], serde_json::json!(0));
        assert_eq!(fields["deleted"], serde_json::json!(false));
        assert!(fields.contains_key("created_by"));
    }

    #[test]
    fn test_fields_round_trip_drops_pending() {
        let mut contact = Contact::new("Jeanne", "jeanne@example.org");
        contact.increment_version(&Actor::system());

        let back: Contact = ban_core::value::from_fields(&contact.fields().unwrap()).unwrap();
        assert_eq!(back.pending_version(), None);
        assert_eq!(back.name, "Jeanne");
        assert_eq!(back.id(), contact.id());
    }
}
