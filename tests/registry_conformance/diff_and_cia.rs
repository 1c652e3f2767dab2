//! Diff engine and CIA derivation through the public surface

use crate::common::Commune;
use ban::{compute_cia, make_diff, tmp_fantoir, Fields, HouseNumber, Position, META_FIELDS, VersionedEntity};
use serde_json::json;

fn fields(value: serde_json::Value) -> Fields {
    serde_json::from_value(value).unwrap()
}

#[test]
fn diff_of_changed_name() {
    let diff = make_diff(&fields(json!({"name": "A"})), &fields(json!({"name": "B"})), false);
    assert_eq!(diff.len(), 1);
    assert_eq!(diff["name"].old.as_deref(), Some("A"));
    assert_eq!(diff["name"].new.as_deref(), Some("B"));
}

#[test]
fn diff_ignores_unchanged_and_metadata() {
    let old = fields(json!({
        "name": "A", "version": 1, "cia": "x", "modified_by": "a", "modified_at": "t1"
    }));
    let new = fields(json!({
        "name": "A", "version": 2, "cia": "y", "modified_by": "b", "modified_at": "t2"
    }));
    assert!(make_diff(&old, &new, false).is_empty());
    assert!(META_FIELDS.contains(&"cia"));
}

#[test]
fn diff_update_only_ignores_removed_fields() {
    let old = fields(json!({"name": "A", "alias": "B"}));
    let new = fields(json!({"name": "A"}));

    let full = make_diff(&old, &new, false);
    assert_eq!(full["alias"].old.as_deref(), Some("B"));
    assert_eq!(full["alias"].new, None);
    assert!(make_diff(&old, &new, true).is_empty());
}

#[test]
fn cia_examples() {
    assert_eq!(compute_cia("93031", "1491H", Some("84"), Some("bis")), "93031_1491H__84_BIS");
    assert_eq!(compute_cia("93031", "1491H", Some("84"), Some("")), "93031_1491H__84_");
    assert_eq!(tmp_fantoir("Rue des Pêchers"), "#RUEDESPECHERS");
}

#[test]
fn locality_housenumber_uses_placeholder_code() {
    let commune = Commune::new();
    let mut hn = HouseNumber::on_locality(commune.locality.id(), "12");
    commune.registry.create(&commune.actor, &mut hn).unwrap();
    assert_eq!(hn.cia.as_deref(), Some("93031_#LABRICHE__12_"));
}

#[test]
fn center_comes_from_position() {
    let commune = Commune::new();
    let hn = commune.housenumber("1", None);
    assert_eq!(hn.center(&commune.registry).unwrap(), None);

    let position: Position = commune.position(&hn, Some((2.31, 48.95)));
    assert_eq!(
        hn.center(&commune.registry).unwrap(),
        Some(json!({"type": "Point", "coordinates": [2.31, 48.95]}))
    );
    assert_eq!(hn.center(&commune.registry).unwrap(), position.center_json());
}
