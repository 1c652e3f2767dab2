//! Geographic position of a house number

use super::{export_base, EntityMeta, HouseNumber, VersionedEntity};
use crate::registry::Registry;
use crate::view::RegistryView;
use ban_core::{BanError, BanResult, EntityId, EntityKind, EntityRef, Fields};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A position of a house number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Owning house number
    pub housenumber: EntityId,
    /// `(longitude, latitude)`
    #[serde(default)]
    pub center: Option<(f64, f64)>,
    /// Position kind, e.g. `"entrance"`
    #[serde(default)]
    pub kind: Option<String>,
    /// Data source
    #[serde(default)]
    pub source: Option<String>,
    /// Free-form attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Position {
    /// New, unsaved position
    pub fn new(housenumber: EntityId, center: Option<(f64, f64)>) -> Self {
        Self {
            meta: EntityMeta::new(),
            housenumber,
            center,
            kind: None,
            source: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Center as a GeoJSON point, `None` without coordinates
    pub fn center_json(&self) -> Option<Value> {
        self.center.map(|(x, y)| {
            json!({
                "type": "Point",
                "coordinates": [x, y],
            })
        })
    }

    /// Current house number row
    pub fn load_housenumber(&self, registry: &Registry) -> BanResult<HouseNumber> {
        registry.get(self.housenumber)
    }
}

impl VersionedEntity for Position {
    const KIND: EntityKind = EntityKind::Position;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn relations(&self) -> Vec<EntityRef> {
        vec![EntityRef::new(EntityKind::HouseNumber, self.housenumber)]
    }

    fn validate(&self) -> BanResult<()> {
        if let Some((x, y)) = self.center {
            if !x.is_finite() || !y.is_finite() {
                return Err(BanError::validation(format!(
                    "position center must be finite, got ({}, {})",
                    x, y
                )));
            }
        }
        Ok(())
    }

    fn as_export(&self, _view: &RegistryView) -> BanResult<Fields> {
        let mut fields = export_base(self);
        fields.insert("housenumber".to_string(), json!(self.housenumber));
        fields.insert("center".to_string(), self.center_json().unwrap_or(Value::Null));
        fields.insert("kind".to_string(), json!(self.kind));
        fields.insert("source".to_string(), json!(self.source));
        fields.insert("attributes".to_string(), json!(self.attributes));
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_json() {
        let position = Position::new(EntityId::new(), Some((2.35, 48.85)));
        assert_eq!(
            position.center_json(),
            Some(json!({"type": "Point", "coordinates": [2.35, 48.85]}))
        );
    }

    #[test]
    fn test_no_center() {
        assert_eq!(Position::new(EntityId::new(), None).center_json(), None);
    }

    #[test]
    fn test_attributes_are_part_of_the_snapshot() {
        let position = Position::new(EntityId::new(), None).with_attribute("foo", "bar");
        let fields = position.fields().unwrap();
        assert_eq!(fields["attributes"], json!({"foo": "bar"}));
    }

    #[test]
    fn test_non_finite_center_is_rejected() {
        let position = Position::new(EntityId::new(), Some((f64::NAN, 1.0)));
        assert!(position.validate().unwrap_err().is_validation());
    }
}
