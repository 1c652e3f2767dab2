//! Municipality (commune), identified by its INSEE code

use super::{export_base, EntityMeta, VersionedEntity};
use crate::view::RegistryView;
use ban_core::{BanError, BanResult, EntityKind, Fields};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A municipality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Five-character INSEE code
    pub insee: String,
    /// Official name
    pub name: String,
    /// SIREN number, when known
    #[serde(default)]
    pub siren: Option<String>,
}

impl Municipality {
    /// New, unsaved municipality
    pub fn new(insee: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            insee: insee.into(),
            name: name.into(),
            siren: None,
        }
    }

    /// Set the SIREN number
    pub fn with_siren(mut self, siren: impl Into<String>) -> Self {
        self.siren = Some(siren.into());
        self
    }
}

impl VersionedEntity for Municipality {
    const KIND: EntityKind = EntityKind::Municipality;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self) -> BanResult<()> {
        if self.insee.trim().is_empty() {
            return Err(BanError::validation("municipality insee is required"));
        }
        if self.name.trim().is_empty() {
            return Err(BanError::validation("municipality name is required"));
        }
        Ok(())
    }

    fn as_export(&self, _view: &RegistryView) -> BanResult<Fields> {
        let mut fields = export_base(self);
        fields.insert("insee".to_string(), json!(self.insee));
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("siren".to_string(), json!(self.siren));
        Ok(fields)
    }
}
