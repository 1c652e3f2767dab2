//! Core types for the address registry
//!
//! This module defines the foundational types:
//! - EntityId: Stable primary identifier of a registry entity
//! - EntityKind: Discriminator for the entity variants (one table each)
//! - EntityRef: (kind, id) pair used for relations and error reporting
//! - KeySpace / Key: Composite storage key (kind + space + id + tail)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primary identifier of a registry entity
///
/// A wrapper around a UUID v4. Serialized as its hyphenated string form so
/// snapshots and exports stay human readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new random EntityId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero id; sorts before every other id
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Create an EntityId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse an EntityId from a string representation
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this EntityId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that a string is a well-formed UUID of version 4
///
/// Identifiers handed over by collaborators (import files, API payloads)
/// are checked with this before being turned into an `EntityId`.
pub fn is_uuid4(candidate: &str) -> bool {
    match Uuid::parse_str(candidate) {
        Ok(uuid) => uuid.get_version_num() == 4,
        Err(_) => false,
    }
}

/// Entity variant discriminator
///
/// Each variant maps to its own logical table and its own ledger table.
/// The byte values define the sort order of keys in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum EntityKind {
    /// Municipality (commune)
    Municipality = 0x01,
    /// Street (voie)
    Street = 0x02,
    /// Locality (lieu-dit)
    Locality = 0x03,
    /// House number attached to a street or a locality
    HouseNumber = 0x04,
    /// Geographic position of a house number
    Position = 0x05,
    /// Contact person
    Contact = 0x06,
    /// Postal code
    PostCode = 0x07,
}

impl EntityKind {
    /// All kinds, in key order
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Municipality,
        EntityKind::Street,
        EntityKind::Locality,
        EntityKind::HouseNumber,
        EntityKind::Position,
        EntityKind::Contact,
        EntityKind::PostCode,
    ];

    /// Convert to byte representation
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Try to create from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        EntityKind::ALL.iter().copied().find(|k| k.as_byte() == byte)
    }

    /// Stable lowercase name, used as table name and in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Municipality => "municipality",
            EntityKind::Street => "street",
            EntityKind::Locality => "locality",
            EntityKind::HouseNumber => "housenumber",
            EntityKind::Position => "position",
            EntityKind::Contact => "contact",
            EntityKind::PostCode => "postcode",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed reference to an entity row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity variant
    pub kind: EntityKind,
    /// Primary identifier
    pub id: EntityId,
}

impl EntityRef {
    /// Create a new entity reference
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    /// Storage key of the live row
    pub fn row_key(&self) -> Key {
        Key::row(self.kind, self.id)
    }

    /// Storage key of one ledger entry
    pub fn ledger_key(&self, sequence: u64) -> Key {
        Key::ledger(self.kind, self.id, sequence)
    }

    /// Prefix covering every ledger entry of this entity
    pub fn ledger_prefix(&self) -> KeyPrefix {
        KeyPrefix::entity(self.kind, KeySpace::Ledger, self.id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Logical table within an entity kind
///
/// Ordering: Row < Ledger < Unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeySpace {
    /// The live, mutable entity row
    Row,
    /// Immutable ledger entries, one per version
    Ledger,
    /// Uniqueness claims scoped by a parent id
    Unique,
}

/// Composite storage key
///
/// Keys are ordered by kind, then space, then id, then tail. For ledger keys
/// the tail is the big-endian sequence number so a prefix scan returns the
/// entries of one entity in ascending sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// Entity kind the key belongs to
    pub kind: EntityKind,
    /// Logical table
    pub space: KeySpace,
    /// Owning entity (rows, ledger) or scoping parent (unique claims)
    pub id: EntityId,
    /// Space-specific suffix
    pub tail: Vec<u8>,
}

impl Key {
    /// Key of a live entity row
    pub fn row(kind: EntityKind, id: EntityId) -> Self {
        Self {
            kind,
            space: KeySpace::Row,
            id,
            tail: Vec::new(),
        }
    }

    /// Key of one ledger entry
    pub fn ledger(kind: EntityKind, id: EntityId, sequence: u64) -> Self {
        Self {
            kind,
            space: KeySpace::Ledger,
            id,
            tail: sequence.to_be_bytes().to_vec(),
        }
    }

    /// Key of a uniqueness claim inside the scope of `scope`
    pub fn unique(kind: EntityKind, scope: EntityId, claim: &str) -> Self {
        Self {
            kind,
            space: KeySpace::Unique,
            id: scope,
            tail: claim.as_bytes().to_vec(),
        }
    }

    /// Sequence number encoded in a ledger key
    pub fn sequence(&self) -> Option<u64> {
        if self.space != KeySpace::Ledger {
            return None;
        }
        let bytes: [u8; 8] = self.tail.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// The entity this key belongs to (meaningless for unique claims)
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id)
    }

    /// Check whether this key falls under `prefix`
    pub fn starts_with(&self, prefix: &KeyPrefix) -> bool {
        self.kind == prefix.kind
            && self.space == prefix.space
            && prefix.id.map_or(true, |id| id == self.id)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.space {
            KeySpace::Row => write!(f, "{}/row/{}", self.kind, self.id),
            KeySpace::Ledger => match self.sequence() {
                Some(seq) => write!(f, "{}/ledger/{}/{}", self.kind, self.id, seq),
                None => write!(f, "{}/ledger/{}/?", self.kind, self.id),
            },
            KeySpace::Unique => write!(
                f,
                "{}/unique/{}/{}",
                self.kind,
                self.id,
                String::from_utf8_lossy(&self.tail)
            ),
        }
    }
}

/// Range selector for prefix scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPrefix {
    /// Entity kind
    pub kind: EntityKind,
    /// Logical table
    pub space: KeySpace,
    /// Restrict to one id, or the whole table when `None`
    pub id: Option<EntityId>,
}

impl KeyPrefix {
    /// Every key of a table
    pub fn table(kind: EntityKind, space: KeySpace) -> Self {
        Self {
            kind,
            space,
            id: None,
        }
    }

    /// Every key of one id inside a table
    pub fn entity(kind: EntityKind, space: KeySpace, id: EntityId) -> Self {
        Self {
            kind,
            space,
            id: Some(id),
        }
    }

    /// Smallest key matching this prefix, used as range start
    pub fn start_key(&self) -> Key {
        Key {
            kind: self.kind,
            space: self.space,
            id: self.id.unwrap_or_else(EntityId::nil),
            tail: Vec::new(),
        }
    }
}
