//! Postal code

use super::{export_base, EntityMeta, Municipality, VersionedEntity};
use crate::view::RegistryView;
use ban_core::{BanError, BanResult, EntityId, EntityKind, EntityRef, Fields};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A postal code serving (part of) a municipality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCode {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Five-digit code
    pub code: String,
    /// Routing label
    pub name: String,
    /// Municipality served
    pub municipality: EntityId,
}

impl PostCode {
    /// New, unsaved postal code
    pub fn new(code: impl Into<String>, name: impl Into<String>, municipality: EntityId) -> Self {
        Self {
            meta: EntityMeta::new(),
            code: code.into(),
            name: name.into(),
            municipality,
        }
    }
}

impl VersionedEntity for PostCode {
    const KIND: EntityKind = EntityKind::PostCode;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn relations(&self) -> Vec<EntityRef> {
        vec![EntityRef::new(EntityKind::Municipality, self.municipality)]
    }

    fn validate(&self) -> BanResult<()> {
        if self.code.trim().is_empty() {
            return Err(BanError::validation("postcode code is required"));
        }
        Ok(())
    }

    fn as_export(&self, view: &RegistryView) -> BanResult<Fields> {
        let municipality: Municipality = view.get(self.municipality)?;
        let mut fields = export_base(self);
        fields.insert("code".to_string(), json!(self.code));
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("municipality".to_string(), json!(self.municipality));
        fields.insert("municipality_insee".to_string(), json!(municipality.insee));
        Ok(fields)
    }
}
