//! Version numbering and reconstruction

use crate::common::{actor, registry, Commune};
use ban::{Contact, HouseNumber, Municipality, Street, VersionedEntity};

#[test]
fn created_entities_have_one_version() {
    let commune = Commune::new();
    let registry = &commune.registry;
    assert_eq!(
        registry
            .versions::<Municipality>(commune.municipality.id())
            .unwrap()
            .len(),
        1
    );
    assert_eq!(registry.versions::<Street>(commune.street.id()).unwrap().len(), 1);
    assert_eq!(commune.municipality.version(), 1);
    assert_eq!(commune.street.version(), 1);
}

#[test]
fn n_saves_give_n_versions() {
    let registry = registry();
    let actor = actor();
    let mut contact = Contact::new("Agent 0", "agent@example.org");
    registry.create(&actor, &mut contact).unwrap();

    for n in 1..10 {
        contact.name = format!("Agent {}", n);
        contact.increment_version(&actor);
        registry.save(&actor, &mut contact).unwrap();
    }

    assert_eq!(contact.version(), 10);
    let versions = registry.versions::<Contact>(contact.id()).unwrap();
    assert_eq!(versions.len(), 10);
    for (i, entry) in versions.iter().enumerate() {
        let entry = entry.unwrap();
        assert_eq!(entry.sequence, i as u64 + 1);
        assert_eq!(entry.load::<Contact>().unwrap().name, format!("Agent {}", i));
    }
}

#[test]
fn loading_a_version_does_not_touch_the_live_row() {
    let mut commune = Commune::new();
    commune.rename_street("Rue des Poires");

    let versions = commune.registry.versions::<Street>(commune.street.id()).unwrap();
    let old = versions.get(0).unwrap().load::<Street>().unwrap();
    assert_eq!(old.name, "Rue des Pommes");
    assert_eq!(old.sequence(), 1);

    let live: Street = commune.registry.get(commune.street.id()).unwrap();
    assert_eq!(live.name, "Rue des Poires");
    assert_eq!(live.version(), 2);
}

#[test]
fn housenumber_versions_keep_ordinals() {
    let commune = Commune::new();
    let mut hn = commune.housenumber("84", Some("b"));
    hn.ordinal = Some("bis".to_string());
    hn.increment_version(&commune.actor);
    commune
        .registry
        .persist_new_version(&commune.actor, &mut hn)
        .unwrap();

    assert_eq!(hn.version(), 2);
    let versions = commune.registry.versions::<HouseNumber>(hn.id()).unwrap();
    assert_eq!(versions.len(), 2);
    let v1 = versions.get(0).unwrap().load::<HouseNumber>().unwrap();
    let v2 = versions.get(1).unwrap().load::<HouseNumber>().unwrap();
    assert_eq!(v1.ordinal.as_deref(), Some("b"));
    assert_eq!(v1.cia.as_deref(), Some("93031_1491H__84_B"));
    assert_eq!(v2.ordinal.as_deref(), Some("bis"));
    assert_eq!(v2.cia.as_deref(), Some("93031_1491H__84_BIS"));
    assert_eq!(v2.load_street(&commune.registry).unwrap(), Some(commune.street.clone()));
}

#[test]
fn soft_deleted_owner_keeps_history() {
    let commune = Commune::new();
    let mut hn = commune.housenumber("3", None);
    commune.registry.mark_deleted(&commune.actor, &mut hn).unwrap();

    let versions = commune.registry.versions::<HouseNumber>(hn.id()).unwrap();
    assert_eq!(versions.len(), 2);
    assert!(!versions.get(0).unwrap().load::<HouseNumber>().unwrap().meta.deleted);
    assert!(commune.registry.list::<HouseNumber>().unwrap().is_empty());
}
