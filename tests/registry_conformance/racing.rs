//! Two saves racing on the same base version

use crate::common::Commune;
use ban::{Municipality, VersionedEntity};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn exactly_one_of_two_racing_saves_wins() {
    let commune = Commune::new();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["Épinay-A", "Épinay-B"]
        .into_iter()
        .map(|name| {
            let registry = commune.registry.clone();
            let actor = commune.actor.clone();
            let barrier = Arc::clone(&barrier);
            let mut town = commune.municipality.clone();
            thread::spawn(move || {
                town.name = name.to_string();
                town.increment_version(&actor);
                barrier.wait();
                registry.persist_new_version(&actor, &mut town).map(|_| town)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<&Municipality> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(loser.is_conflict(), "got {:?}", loser);

    let versions = commune
        .registry
        .versions::<Municipality>(commune.municipality.id())
        .unwrap();
    assert_eq!(versions.len(), 2);
    let latest = versions.get(1).unwrap().load::<Municipality>().unwrap();
    assert_eq!(latest.name, winners[0].name);
    assert!(versions.get(2).is_err());
}

#[test]
fn loser_can_reload_and_retry() {
    let commune = Commune::new();
    let mut a = commune.municipality.clone();
    let mut b = commune.municipality.clone();

    a.siren = Some("219300316".to_string());
    a.increment_version(&commune.actor);
    commune.registry.persist_new_version(&commune.actor, &mut a).unwrap();

    b.name = "Épinay".to_string();
    b.increment_version(&commune.actor);
    assert!(commune
        .registry
        .persist_new_version(&commune.actor, &mut b)
        .unwrap_err()
        .is_conflict());

    let mut fresh: Municipality = commune.registry.get(a.id()).unwrap();
    fresh.name = "Épinay".to_string();
    fresh.increment_version(&commune.actor);
    commune
        .registry
        .persist_new_version(&commune.actor, &mut fresh)
        .unwrap();
    assert_eq!(fresh.version(), 3);
    assert_eq!(fresh.siren.as_deref(), Some("219300316"));
}
