//! Contact person

use super::{export_base, EntityMeta, VersionedEntity};
use crate::view::RegistryView;
use ban_core::{BanError, BanResult, EntityKind, Fields};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl Contact {
    /// New, unsaved contact
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl VersionedEntity for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self) -> BanResult<()> {
        if self.name.trim().is_empty() {
            return Err(BanError::validation("contact name is required"));
        }
        if !self.email.contains('@') {
            return Err(BanError::validation(format!(
                "invalid contact email '{}'",
                self.email
            )));
        }
        Ok(())
    }

    fn as_export(&self, _view: &RegistryView) -> BanResult<Fields> {
        let mut fields = export_base(self);
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("email".to_string(), json!(self.email));
        Ok(fields)
    }
}
