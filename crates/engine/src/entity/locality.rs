//! Locality (lieu-dit)

use super::{export_base, validate_fantoir, EntityMeta, Municipality, VersionedEntity};
use crate::registry::Registry;
use crate::view::RegistryView;
use ban_core::cia;
use ban_core::{BanError, BanResult, EntityId, EntityKind, EntityRef, Fields};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A locality (named place without a street) of a municipality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Owning municipality
    pub municipality: EntityId,
    /// Official FANTOIR code, when known
    #[serde(default)]
    pub fantoir: Option<String>,
    /// Locality name
    pub name: String,
}

impl Locality {
    /// New, unsaved locality
    pub fn new(municipality: EntityId, name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            municipality,
            fantoir: None,
            name: name.into(),
        }
    }

    /// Set the official FANTOIR code
    pub fn with_fantoir(mut self, fantoir: impl Into<String>) -> Self {
        self.fantoir = Some(fantoir.into());
        self
    }

    /// Placeholder code derived from the name
    pub fn tmp_fantoir(&self) -> String {
        cia::tmp_fantoir(&self.name)
    }

    /// Code used in CIAs: the FANTOIR code, or the placeholder
    pub fn code(&self) -> String {
        cia::street_code(self.fantoir.as_deref(), &self.name)
    }

    /// Current municipality row
    pub fn load_municipality(&self, registry: &Registry) -> BanResult<Municipality> {
        registry.get(self.municipality)
    }
}

impl VersionedEntity for Locality {
    const KIND: EntityKind = EntityKind::Locality;

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
        if self.name.trim().is_empty() {
            return Err(BanError::validation("locality name is required"));
        }
        validate_fantoir(self.fantoir.as_deref())
    }

    fn as_export(&self, view: &RegistryView) -> BanResult<Fields> {
        let municipality: Municipality = view.get(self.municipality)?;
        let mut fields = export_base(self);
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("fantoir".to_string(), json!(self.code()));
        fields.insert("municipality".to_string(), json!(self.municipality));
        fields.insert("municipality_insee".to_string(), json!(municipality.insee));
        Ok(fields)
    }
}
