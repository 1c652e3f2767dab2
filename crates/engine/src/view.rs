//! Read-only registry view
//!
//! A `RegistryView` pins one storage snapshot. Every read made through it,
//! including the relations an export resolves, sees the same state, and
//! the snapshot is taken once no matter how many rows are read.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::entity::{Position, VersionedEntity};
use crate::ledger::Versions;
use ban_core::value::from_document;
use ban_core::{BanError, BanResult, EntityId, Fields, Key, KeyPrefix, KeySpace, SnapshotView};
use ban_storage::ClonedSnapshotView;
use serde_json::Value;

/// Point-in-time, read-only view of the registry
#[derive(Debug)]
pub struct RegistryView {
    snapshot: ClonedSnapshotView,
    /// Live positions by house number, built on first use
    positions: OnceLock<HashMap<EntityId, Vec<Position>>>,
}

impl RegistryView {
    pub(crate) fn new(snapshot: ClonedSnapshotView) -> Self {
        Self {
            snapshot,
            positions: OnceLock::new(),
        }
    }

    /// Storage version the view is pinned to
    pub fn version(&self) -> u64 {
        self.snapshot.version()
    }

    /// Row of an entity, soft-deleted or not
    ///
    /// # Errors
    ///
    /// `NotFound` if no row exists in the view.
    pub fn get<E: VersionedEntity>(&self, id: EntityId) -> BanResult<E> {
        let key = Key::row(E::KIND, id);
        match self.snapshot.get(&key)? {
            Some(stored) => from_document(&stored.value),
            None => Err(BanError::not_found(key.entity_ref())),
        }
    }

    /// Live rows of a kind, in id order
    pub fn list<E: VersionedEntity>(&self) -> BanResult<Vec<E>> {
        Ok(self
            .list_with_deleted::<E>()?
            .into_iter()
            .filter(|e| !e.is_deleted())
            .collect())
    }

    /// All rows of a kind, in id order
    pub fn list_with_deleted<E: VersionedEntity>(&self) -> BanResult<Vec<E>> {
        self.snapshot
            .scan_prefix(&KeyPrefix::table(E::KIND, KeySpace::Row))?
            .into_iter()
            .map(|(_, stored)| from_document(&stored.value))
            .collect()
    }

    /// Ledger of an entity, pinned to this view
    ///
    /// # Errors
    ///
    /// `NotFound` if the entity does not exist in the view.
    pub fn versions<E: VersionedEntity>(&self, id: EntityId) -> BanResult<Versions> {
        let entity: E = self.get(id)?;
        Ok(Versions::new(
            entity.entity_ref(),
            entity.version(),
            self.snapshot.clone(),
        ))
    }

    /// GeoJSON center of a house number's first live position, or `None`
    pub fn center_of(&self, housenumber: EntityId) -> BanResult<Option<Value>> {
        Ok(self
            .positions()?
            .get(&housenumber)
            .and_then(|positions| first_center(positions)))
    }

    /// Export views of a kind, resolved against this view
    pub fn export<E: VersionedEntity>(&self, include_deleted: bool) -> BanResult<Vec<Fields>> {
        let entities = if include_deleted {
            self.list_with_deleted::<E>()?
        } else {
            self.list::<E>()?
        };
        entities.iter().map(|e| e.as_export(self)).collect()
    }

    fn positions(&self) -> BanResult<&HashMap<EntityId, Vec<Position>>> {
        if let Some(index) = self.positions.get() {
            return Ok(index);
        }
        let mut index: HashMap<EntityId, Vec<Position>> = HashMap::new();
        for position in self.list::<Position>()? {
            index.entry(position.housenumber).or_default().push(position);
        }
        Ok(self.positions.get_or_init(|| index))
    }
}

/// Center of the earliest created position that has one
///
/// Ties on creation time are broken by id.
pub(crate) fn first_center(positions: &[Position]) -> Option<Value> {
    positions
        .iter()
        .filter(|p| p.center.is_some())
        .min_by_key(|p| (p.meta.audit.created_at, p.meta.id))
        .and_then(Position::center_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::entity::{HouseNumber, Municipality, Street};
    use crate::registry::Registry;
    use ban_core::Actor;

    fn street(registry: &Registry, actor: &Actor) -> Street {
        let mut town = Municipality::new("93031", "Épinay-sur-Seine");
        registry.create(actor, &mut town).unwrap();
        let mut street = Street::new(town.id(), "Rue des Pommes").with_fantoir("1491H");
        registry.create(actor, &mut street).unwrap();
        street
    }

    #[test]
    fn test_view_is_pinned() {
        let registry = Registry::new(Database::new());
        let actor = Actor::new("viewer");
        let mut street = street(&registry, &actor);

        let view = registry.view();
        street.name = "Rue des Poires".to_string();
        street.increment_version(&actor);
        registry.persist_new_version(&actor, &mut street).unwrap();

        assert_eq!(view.get::<Street>(street.id()).unwrap().name, "Rue des Pommes");
        assert_eq!(view.versions::<Street>(street.id()).unwrap().len(), 1);
        assert_eq!(registry.get::<Street>(street.id()).unwrap().name, "Rue des Poires");
    }

    #[test]
    fn test_center_of_reads_the_pinned_snapshot() {
        let registry = Registry::new(Database::new());
        let actor = Actor::new("viewer");
        let street = street(&registry, &actor);
        let mut hn = HouseNumber::on_street(street.id(), "1");
        registry.create(&actor, &mut hn).unwrap();

        let view = registry.view();
        assert_eq!(view.center_of(hn.id()).unwrap(), None);

        let mut position = Position::new(hn.id(), Some((2.3, 48.9)));
        registry.create(&actor, &mut position).unwrap();
        assert_eq!(view.center_of(hn.id()).unwrap(), None);
        assert_eq!(
            registry.view().center_of(hn.id()).unwrap(),
            position.center_json()
        );
    }

    #[test]
    fn test_first_center_skips_positions_without_center() {
        let hn = EntityId::new();
        let empty = Position::new(hn, None);
        let located = Position::new(hn, Some((1.0, 2.0)));
        assert_eq!(
            first_center(&[empty, located.clone()]),
            located.center_json()
        );
        assert_eq!(first_center(&[]), None);
    }
}
