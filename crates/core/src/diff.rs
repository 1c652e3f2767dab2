//! Field-level diff between two entity states
//!
//! The diff engine compares two flattened states (`Fields`) and reports,
//! for each business field whose value changed, the old and new value
//! rendered as strings. Metadata fields (identifier, audit fields, version
//! number, computed CIA) never appear in a diff.
//!
//! An absent field and an explicit `null` are the same thing: both render
//! as `None`.

use crate::value::{render, Fields};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields excluded from every diff
pub const META_FIELDS: &[&str] = &[
    "pk",
    "id",
    "created_by",
    "modified_by",
    "created_at",
    "modified_at",
    "version",
    "cia",
];

/// Old and new rendering of one changed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the change, `None` when absent or null
    pub old: Option<String>,
    /// Value after the change, `None` when absent or null
    pub new: Option<String>,
}

impl FieldChange {
    /// Create a change record
    pub fn new(old: Option<String>, new: Option<String>) -> Self {
        Self { old, new }
    }
}

/// Structured diff: changed field name → change
pub type Diff = BTreeMap<String, FieldChange>;

/// True if `field` is excluded from diffs
pub fn is_meta_field(field: &str) -> bool {
    META_FIELDS.contains(&field)
}

/// Compute the diff between two states of the same entity
///
/// With `update_only == false` the union of both key sets is considered, so
/// removed fields show up with `new: None`. With `update_only == true` only
/// the keys of `new` are considered: additions and changes, never removals.
///
/// # Example
///
/// ```
/// use ban_core::diff::{make_diff, FieldChange};
/// use ban_core::value::Fields;
/// use serde_json::json;
///
/// let old: Fields = [("name".to_string(), json!("A"))].into_iter().collect();
/// let new: Fields = [("name".to_string(), json!("B"))].into_iter().collect();
/// let diff = make_diff(&old, &new, false);
/// assert_eq!(diff["name"], FieldChange::new(Some("A".into()), Some("B".into())));
/// ```
pub fn make_diff(old: &Fields, new: &Fields, update_only: bool) -> Diff {
    let null = serde_json::Value::Null;
    let mut keys: Vec<&String> = new.keys().collect();
    if !update_only {
        keys.extend(old.keys().filter(|k| !new.contains_key(*k)));
    }

    keys.into_iter()
        .filter(|key| !is_meta_field(key))
        .filter_map(|key| {
            let old_value = old.get(key).unwrap_or(&null);
            let new_value = new.get(key).unwrap_or(&null);
            if old_value == new_value {
                None
            } else {
                Some((key.clone(), FieldChange::new(render(old_value), render(new_value))))
            }
        })
        .collect()
}
