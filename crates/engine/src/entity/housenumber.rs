//! House number
//!
//! A house number hangs off a street or a locality. Its CIA is recomputed
//! from the parent chain on every save, and its `(number, ordinal)` pair is
//! unique, case-insensitively, among the live house numbers of one parent.
//! Surrounding whitespace is stripped from the number and ordinal on save.

use super::{
    export_base, EntityMeta, Locality, Municipality, Position, PostCode, Street, VersionedEntity,
};
use crate::registry::Registry;
use crate::transaction_ops::RegistryTxnExt;
use crate::view::{first_center, RegistryView};
use ban_concurrency::TransactionContext;
use ban_core::{compute_cia, BanError, BanResult, EntityId, EntityKind, EntityRef, Fields};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A house number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseNumber {
    /// Identity, version and audit fields
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Parent street or locality
    pub parent: EntityRef,
    /// Number, e.g. `"84"`
    pub number: String,
    /// Ordinal, e.g. `"bis"`
    #[serde(default)]
    pub ordinal: Option<String>,
    /// Postal code, when assigned
    #[serde(default)]
    pub postcode: Option<EntityId>,
    /// Composite identifier, derived on save
    #[serde(default)]
    pub cia: Option<String>,
}

impl HouseNumber {
    /// New, unsaved house number on a street
    pub fn on_street(street: EntityId, number: impl Into<String>) -> Self {
        Self::with_parent(EntityRef::new(EntityKind::Street, street), number)
    }

    /// New, unsaved house number on a locality
    pub fn on_locality(locality: EntityId, number: impl Into<String>) -> Self {
        Self::with_parent(EntityRef::new(EntityKind::Locality, locality), number)
    }

    fn with_parent(parent: EntityRef, number: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            parent,
            number: number.into(),
            ordinal: None,
            postcode: None,
            cia: None,
        }
    }

    /// Set the ordinal
    pub fn with_ordinal(mut self, ordinal: impl Into<String>) -> Self {
        self.ordinal = Some(ordinal.into());
        self
    }

    /// Set the postal code
    pub fn with_postcode(mut self, postcode: EntityId) -> Self {
        self.postcode = Some(postcode);
        self
    }

    /// Uniqueness claim text: `NUMBER|ORDINAL`, uppercased
    pub fn number_claim(&self) -> String {
        format!(
            "{}|{}",
            self.number.trim().to_uppercase(),
            self.ordinal.as_deref().unwrap_or_default().trim().to_uppercase()
        )
    }

    /// Current parent row, when the parent is a street
    pub fn load_street(&self, registry: &Registry) -> BanResult<Option<Street>> {
        match self.parent.kind {
            EntityKind::Street => registry.get(self.parent.id).map(Some),
            _ => Ok(None),
        }
    }

    /// Current parent row, when the parent is a locality
    pub fn load_locality(&self, registry: &Registry) -> BanResult<Option<Locality>> {
        match self.parent.kind {
            EntityKind::Locality => registry.get(self.parent.id).map(Some),
            _ => Ok(None),
        }
    }

    /// GeoJSON center of the first live position, or `None`
    ///
    /// Positions are ordered by creation time.
    pub fn center(&self, registry: &Registry) -> BanResult<Option<Value>> {
        let positions: Vec<Position> = registry
            .list::<Position>()?
            .into_iter()
            .filter(|p| p.housenumber == self.meta.id)
            .collect();
        Ok(first_center(&positions))
    }

    fn parent_code(&self, txn: &mut TransactionContext) -> BanResult<(EntityId, String)> {
        let missing = || BanError::validation(format!("parent {} does not exist", self.parent));
        match self.parent.kind {
            EntityKind::Street => {
                let street: Street = txn.read_entity(self.parent.id)?.ok_or_else(missing)?;
                Ok((street.municipality, street.code()))
            }
            EntityKind::Locality => {
                let locality: Locality = txn.read_entity(self.parent.id)?.ok_or_else(missing)?;
                Ok((locality.municipality, locality.code()))
            }
            other => Err(BanError::validation(format!(
                "house number parent must be a street or a locality, got {}",
                other
            ))),
        }
    }
}

impl VersionedEntity for HouseNumber {
    const KIND: EntityKind = EntityKind::HouseNumber;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn relations(&self) -> Vec<EntityRef> {
        let mut relations = vec![self.parent];
        if let Some(postcode) = self.postcode {
            relations.push(EntityRef::new(EntityKind::PostCode, postcode));
        }
        relations
    }

    fn unique_claim(&self) -> Option<(EntityId, String)> {
        Some((self.parent.id, self.number_claim()))
    }

    fn validate(&self) -> BanResult<()> {
        if !matches!(self.parent.kind, EntityKind::Street | EntityKind::Locality) {
            return Err(BanError::validation(format!(
                "house number parent must be a street or a locality, got {}",
                self.parent.kind
            )));
        }
        if self.number.trim().is_empty() {
            return Err(BanError::validation("house number requires a number"));
        }
        Ok(())
    }

    fn prepare(&mut self, txn: &mut TransactionContext) -> BanResult<()> {
        // The claim and the CIA must see the same number and ordinal
        self.number = self.number.trim().to_string();
        self.ordinal = self.ordinal.as_deref().map(|o| o.trim().to_string());

        let (municipality_id, code) = self.parent_code(txn)?;
        let municipality: Municipality = txn.read_entity(municipality_id)?.ok_or_else(|| {
            BanError::validation(format!(
                "municipality {} of {} does not exist",
                municipality_id, self.parent
            ))
        })?;
        self.cia = Some(compute_cia(
            &municipality.insee,
            &code,
            Some(&self.number),
            self.ordinal.as_deref(),
        ));
        Ok(())
    }

    fn as_export(&self, view: &RegistryView) -> BanResult<Fields> {
        let postcode = match self.postcode {
            Some(id) => Some(view.get::<PostCode>(id)?.code),
            None => None,
        };
        let mut fields = export_base(self);
        fields.insert("number".to_string(), json!(self.number));
        fields.insert("ordinal".to_string(), json!(self.ordinal));
        fields.insert("cia".to_string(), json!(self.cia));
        fields.insert("parent".to_string(), json!(self.parent.id));
        fields.insert("parent_kind".to_string(), json!(self.parent.kind));
        fields.insert("postcode".to_string(), json!(postcode));
        fields.insert("center".to_string(), view.center_of(self.meta.id)?.unwrap_or(Value::Null));
        Ok(fields)
    }
}
