//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from a suite's main.rs.

#![allow(dead_code)]

use ban::{
    Actor, Database, HouseNumber, Locality, Municipality, Position, Registry, Street,
    VersionedEntity,
};

/// Fresh in-memory registry
pub fn registry() -> Registry {
    Registry::new(Database::new())
}

/// Actor used by the suites
pub fn actor() -> Actor {
    Actor::new("conformance")
}

/// Municipality 93031 with one street (FANTOIR 1491H) and one locality
pub struct Commune {
    pub registry: Registry,
    pub actor: Actor,
    pub municipality: Municipality,
    pub street: Street,
    pub locality: Locality,
}

impl Commune {
    pub fn new() -> Self {
        let registry = registry();
        let actor = actor();
        let mut municipality = Municipality::new("93031", "Épinay-sur-Seine");
        registry.create(&actor, &mut municipality).unwrap();
        let mut street = Street::new(municipality.id(), "Rue des Pommes").with_fantoir("1491H");
        registry.create(&actor, &mut street).unwrap();
        let mut locality = Locality::new(municipality.id(), "La Briche");
        registry.create(&actor, &mut locality).unwrap();
        Self {
            registry,
            actor,
            municipality,
            street,
            locality,
        }
    }

    /// Create a house number on the street
    pub fn housenumber(&self, number: &str, ordinal: Option<&str>) -> HouseNumber {
        let mut hn = HouseNumber::on_street(self.street.id(), number);
        hn.ordinal = ordinal.map(str::to_string);
        self.registry.create(&self.actor, &mut hn).unwrap();
        hn
    }

    /// Create a position for a house number
    pub fn position(&self, hn: &HouseNumber, center: Option<(f64, f64)>) -> Position {
        let mut position = Position::new(hn.id(), center);
        self.registry.create(&self.actor, &mut position).unwrap();
        position
    }

    /// Rename the street as a new version
    pub fn rename_street(&mut self, name: &str) {
        self.street.name = name.to_string();
        self.street.increment_version(&self.actor);
        self.registry
            .persist_new_version(&self.actor, &mut self.street)
            .unwrap();
    }
}
