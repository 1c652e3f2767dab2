//! (number, ordinal) uniqueness is scoped per parent

use crate::common::Commune;
use ban::{HouseNumber, Street, VersionedEntity};

#[test]
fn duplicate_on_same_street_is_a_validation_error() {
    let commune = Commune::new();
    commune.housenumber("10", Some("b"));

    let mut dup = HouseNumber::on_street(commune.street.id(), "10").with_ordinal("B");
    let err = commune.registry.create(&commune.actor, &mut dup).unwrap_err();
    assert!(err.is_validation(), "got {:?}", err);
    assert!(!err.is_conflict());
}

#[test]
fn same_pair_under_two_parents_is_fine() {
    let commune = Commune::new();
    let mut other = Street::new(commune.municipality.id(), "Rue des Poires");
    commune.registry.create(&commune.actor, &mut other).unwrap();

    commune.housenumber("10", Some("b"));
    let mut hn = HouseNumber::on_street(other.id(), "10").with_ordinal("b");
    commune.registry.create(&commune.actor, &mut hn).unwrap();

    let mut on_locality = HouseNumber::on_locality(commune.locality.id(), "10").with_ordinal("b");
    commune.registry.create(&commune.actor, &mut on_locality).unwrap();
}

#[test]
fn number_without_ordinal_differs_from_with_ordinal() {
    let commune = Commune::new();
    commune.housenumber("10", None);
    commune.housenumber("10", Some("bis"));
    assert_eq!(commune.registry.list::<HouseNumber>().unwrap().len(), 2);
}
