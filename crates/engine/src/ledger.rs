//! Version ledger
//!
//! Append-only history of every entity: one immutable [`LedgerEntry`] per
//! version, stored under `(kind, Ledger, id, sequence)`. Sequences start at
//! 1 and are contiguous; entry `n` holds the full snapshot written by the
//! save that produced version `n` and the diff against entry `n - 1`.
//!
//! ## Reading history
//!
//! [`Versions`] is a lazy, restartable view over one entity's entries,
//! pinned to the storage snapshot taken when it was created. Entries are
//! fetched one key at a time while iterating.
//!
//! [`LedgerEntry::load`] rebuilds a read-only [`Historical`] entity from a
//! snapshot. The owner row is never consulted, so history of soft-deleted
//! entities loads the same way. Relation fields are plain ids: resolving
//! them goes through the registry and yields the *current* related row.

use std::ops::Deref;

use crate::entity::VersionedEntity;
use ban_core::value::{from_document, from_fields};
use ban_core::{Actor, BanError, BanResult, Diff, EntityRef, Fields, SnapshotView};
use ban_storage::ClonedSnapshotView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable version of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Owning entity
    pub entity: EntityRef,
    /// 1-based version number
    pub sequence: u64,
    /// Full flattened state after the save
    pub snapshot: Fields,
    /// Changes against the previous entry, empty for the first one
    pub diff: Diff,
    /// Time of the save
    pub created_at: DateTime<Utc>,
    /// Actor of the save
    pub created_by: Actor,
}

impl LedgerEntry {
    /// Build an entry
    pub fn new(
        entity: EntityRef,
        sequence: u64,
        snapshot: Fields,
        diff: Diff,
        created_at: DateTime<Utc>,
        created_by: Actor,
    ) -> Self {
        Self {
            entity,
            sequence,
            snapshot,
            diff,
            created_at,
            created_by,
        }
    }

    /// Rebuild the entity as it was at this version
    ///
    /// # Errors
    ///
    /// `InvalidOperation` when `E` is not the kind that owns this entry,
    /// `Serialization` when the snapshot does not fit `E`.
    pub fn load<E: VersionedEntity>(&self) -> BanResult<Historical<E>> {
        if self.entity.kind != E::KIND {
            return Err(BanError::invalid_operation(format!(
                "ledger entry of {} cannot be loaded as {}",
                self.entity.kind,
                E::KIND
            )));
        }
        let entity: E = from_fields(&self.snapshot)?;
        Ok(Historical {
            entity,
            sequence: self.sequence,
        })
    }
}

/// Detached, read-only entity rebuilt from a ledger snapshot
///
/// Derefs to the entity for field access. There is no mutable access, so a
/// historical state cannot be handed back to a save path.
#[derive(Debug, Clone)]
pub struct Historical<E> {
    entity: E,
    sequence: u64,
}

impl<E> Historical<E> {
    /// Ledger sequence this state was loaded from
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<E> Deref for Historical<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.entity
    }
}

impl<E> AsRef<E> for Historical<E> {
    fn as_ref(&self) -> &E {
        &self.entity
    }
}

/// Lazy, ordered view of one entity's ledger
///
/// `len()` is the entity version at the pinned snapshot. `iter()` can be
/// called any number of times; each call starts again at sequence 1.
#[derive(Debug, Clone)]
pub struct Versions {
    entity: EntityRef,
    len: u64,
    snapshot: ClonedSnapshotView,
}

impl Versions {
    pub(crate) fn new(entity: EntityRef, len: u64, snapshot: ClonedSnapshotView) -> Self {
        Self {
            entity,
            len,
            snapshot,
        }
    }

    /// Entity whose history this is
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        usize::try_from(self.len).unwrap_or(usize::MAX)
    }

    /// True when the entity has no history
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry at 0-based `index` (sequence `index + 1`)
    ///
    /// # Errors
    ///
    /// `NotFound` when no entry exists at that position.
    pub fn get(&self, index: usize) -> BanResult<LedgerEntry> {
        let missing =
            || BanError::not_found_with(self.entity, format!("no version at index {}", index));
        let sequence = u64::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .ok_or_else(missing)?;
        self.entry(sequence)?.ok_or_else(missing)
    }

    /// Latest entry
    pub fn last(&self) -> BanResult<Option<LedgerEntry>> {
        if self.len == 0 {
            return Ok(None);
        }
        self.entry(self.len)
    }

    /// Iterate entries in ascending sequence order
    pub fn iter(&self) -> VersionIter<'_> {
        VersionIter {
            versions: self,
            next: 1,
        }
    }

    fn entry(&self, sequence: u64) -> BanResult<Option<LedgerEntry>> {
        if sequence == 0 || sequence > self.len {
            return Ok(None);
        }
        match self.snapshot.get(&self.entity.ledger_key(sequence))? {
            Some(stored) => Ok(Some(from_document(&stored.value)?)),
            None => Ok(None),
        }
    }
}

impl<'a> IntoIterator for &'a Versions {
    type Item = BanResult<LedgerEntry>;
    type IntoIter = VersionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over ledger entries, fetching one key per step
#[derive(Debug)]
pub struct VersionIter<'a> {
    versions: &'a Versions,
    next: u64,
}

impl Iterator for VersionIter<'_> {
    type Item = BanResult<LedgerEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.versions.len {
            return None;
        }
        let sequence = self.next;
        self.next += 1;
        match self.versions.entry(sequence) {
            Ok(Some(entry)) => Some(Ok(entry)),
            // Sequences are contiguous up to len
            Ok(None) => Some(Err(BanError::not_found_with(
                self.versions.entity,
                format!("ledger gap at version {}", sequence),
            ))),
            Err(e) => Some(Err(e)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.versions.len.saturating_add(1).saturating_sub(self.next);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
