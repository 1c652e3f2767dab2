//! Audit stamping
//!
//! Every save and every version increment receives the acting user
//! explicitly as an [`Actor`]. There is no ambient "current user".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user (or process) performing a registry operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Create an actor from its stable name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Actor used for internal bookkeeping writes
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// Name of the actor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audit fields carried by every entity
///
/// None of these fields participates in diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    /// Actor that created the entity
    pub created_by: Option<Actor>,
    /// Actor of the last write
    pub modified_by: Option<Actor>,
    /// Creation time, set on first persist
    pub created_at: Option<DateTime<Utc>>,
    /// Time of the last write
    pub modified_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// Audit fields of an entity that was never persisted
    pub fn unsaved() -> Self {
        Self {
            created_by: None,
            modified_by: None,
            created_at: None,
            modified_at: None,
        }
    }

    /// Stamp creation and modification with the same actor and time
    pub fn stamp_created(&mut self, actor: &Actor, at: DateTime<Utc>) {
        self.created_by = Some(actor.clone());
        self.created_at = Some(at);
        self.stamp_modified(actor, at);
    }

    /// Stamp a modification
    pub fn stamp_modified(&mut self, actor: &Actor, at: DateTime<Utc>) {
        self.modified_by = Some(actor.clone());
        self.modified_at = Some(at);
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self::unsaved()
    }
}
