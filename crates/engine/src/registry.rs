//! Registry: the save paths and read paths of versioned entities
//!
//! ## Save paths
//!
//! All writes run inside one `Database::transaction`, so a failed check at
//! any step leaves neither a row update nor a ledger entry behind.
//!
//! | operation              | row write                | ledger entry |
//! |------------------------|--------------------------|--------------|
//! | `create`               | CAS, expected absent     | sequence 1   |
//! | `persist_new_version`  | CAS on the version read  | sequence `version + 1` |
//! | `persist_unversioned`  | CAS on the version read  | none         |
//! | `mark_deleted`         | as `persist_new_version` | `deleted: false → true` |
//!
//! The row CAS and the expected-absent CAS on the new ledger key are what
//! keep two racing saves from both landing: the first committer wins, the
//! other gets `Conflict`. Uniqueness claims are rows in the `Unique` key
//! space, taken with the same expected-absent CAS and released on delete.
//!
//! ## Read paths
//!
//! None of them take the commit lock. `get` and `list` read the store under
//! its read lock; `versions` and `export` go through a [`RegistryView`]
//! pinned to one snapshot, so an export resolves every relation against
//! the same state.

use std::sync::Arc;

use crate::database::Database;
use crate::entity::VersionedEntity;
use crate::ledger::{LedgerEntry, Versions};
use crate::transaction_ops::RegistryTxnExt;
use crate::view::RegistryView;
use ban_concurrency::TransactionContext;
use ban_core::value::{from_document, to_document};
use ban_core::{
    make_diff, Actor, BanError, BanResult, Diff, EntityId, Fields, Key, KeyPrefix, KeySpace,
    Storage,
};
use chrono::Utc;
use tracing::info;

/// Entry point for versioned entity operations
///
/// # Example
///
/// ```text
/// let registry = Registry::new(Database::new());
/// let actor = Actor::new("alice");
///
/// let mut town = Municipality::new("93031", "Épinay-sur-Seine");
/// registry.create(&actor, &mut town)?;          // version 1
///
/// town.name = "Epinay-sur-Seine".into();
/// town.increment_version(&actor);
/// registry.persist_new_version(&actor, &mut town)?;  // version 2
///
/// let first = registry.versions::<Municipality>(town.id())?.get(0)?;
/// assert_eq!(first.load::<Municipality>()?.name, "Épinay-sur-Seine");
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    db: Arc<Database>,
}

impl Registry {
    /// Create a registry over a database
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Underlying database
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    // ========== Save paths ==========

    /// Persist a new entity as version 1 with its first ledger entry
    ///
    /// On success `entity` carries version 1, creation audit fields and
    /// any derived field (the CIA of a house number).
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the entity was already persisted
    /// - `Validation` on invalid attributes, a missing or deleted relation,
    ///   or a taken uniqueness slot
    /// - `Conflict` if a concurrent transaction wins the race
    pub fn create<E: VersionedEntity>(&self, actor: &Actor, entity: &mut E) -> BanResult<()> {
        if entity.version() != 0 {
            return Err(BanError::invalid_operation(format!(
                "{} is already persisted at version {}",
                entity.entity_ref(),
                entity.version()
            )));
        }
        entity.validate()?;

        let mut working = entity.clone();
        let now = Utc::now();
        self.db.transaction(|txn| {
            let target = working.entity_ref();
            if txn.get_versioned(&target.row_key())?.is_some() {
                return Err(BanError::conflict(format!("{} already exists", target)));
            }
            check_relations(txn, &working)?;
            working.prepare(txn)?;
            move_claim(txn, None, &working)?;

            let meta = working.meta_mut();
            meta.set_persisted_version(1);
            meta.deleted = false;
            meta.audit.stamp_created(actor, now);

            let entry =
                LedgerEntry::new(target, 1, working.fields()?, Diff::new(), now, actor.clone());
            txn.cas(target.row_key(), 0, to_document(&working)?)?;
            txn.append_ledger(&entry)
        })?;

        log_appended(&working, 0);
        *entity = working;
        Ok(())
    }

    /// Persist business changes as a new version
    ///
    /// Requires a prior `increment_version`. In one transaction: re-checks
    /// relations and uniqueness, recomputes derived fields, writes the row
    /// at the pending version and appends the ledger entry holding the full
    /// snapshot and the diff against the previous entry.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` without a pending version
    /// - `NotFound` if the row does not exist
    /// - `Conflict` if the stored version moved since `entity` was read, or
    ///   a concurrent save wins the race
    /// - `Validation` on invalid attributes, relations or uniqueness
    pub fn persist_new_version<E: VersionedEntity>(
        &self,
        actor: &Actor,
        entity: &mut E,
    ) -> BanResult<()> {
        let pending = match entity.pending_version() {
            Some(pending) if pending == entity.version() + 1 => pending,
            Some(pending) => {
                return Err(BanError::invalid_operation(format!(
                    "pending version {} does not follow version {} of {}",
                    pending,
                    entity.version(),
                    entity.entity_ref()
                )))
            }
            None => {
                return Err(BanError::invalid_operation(format!(
                    "no pending version on {}; call increment_version first",
                    entity.entity_ref()
                )))
            }
        };
        entity.validate()?;

        let mut working = entity.clone();
        let now = Utc::now();
        let diff_size = self.db.transaction(|txn| {
            let target = working.entity_ref();
            let (stored, storage_version) = read_stored::<E>(txn, &working)?;

            if !working.is_deleted() {
                check_relations(txn, &working)?;
                working.prepare(txn)?;
            }
            move_claim(txn, Some(&stored), &working)?;

            let previous = match txn.ledger_entry(target, stored.version())? {
                Some(entry) => entry.snapshot,
                None => Fields::new(),
            };

            let meta = working.meta_mut();
            meta.set_persisted_version(pending);
            meta.audit.stamp_modified(actor, now);

            let snapshot = working.fields()?;
            let diff = make_diff(&previous, &snapshot, false);
            let diff_size = diff.len();
            let entry = LedgerEntry::new(target, pending, snapshot, diff, now, actor.clone());
            txn.cas(target.row_key(), storage_version, to_document(&working)?)?;
            txn.append_ledger(&entry)?;
            Ok(diff_size)
        })?;

        log_appended(&working, diff_size);
        *entity = working;
        Ok(())
    }

    /// Persist infrastructure-only changes without a new version
    ///
    /// Refreshes derived fields and audit stamps. Any difference in a
    /// business field against the stored row is rejected: business changes
    /// must go through `persist_new_version`.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` with a pending version, or on an unsaved entity
    /// - `NotFound` if the row does not exist
    /// - `Conflict` if the stored version moved since `entity` was read
    /// - `Validation` if a business field changed
    pub fn persist_unversioned<E: VersionedEntity>(
        &self,
        actor: &Actor,
        entity: &mut E,
    ) -> BanResult<()> {
        if entity.pending_version().is_some() {
            return Err(BanError::invalid_operation(format!(
                "{} has a pending version; use persist_new_version",
                entity.entity_ref()
            )));
        }
        if entity.version() == 0 {
            return Err(BanError::invalid_operation(format!(
                "{} was never created",
                entity.entity_ref()
            )));
        }

        let mut working = entity.clone();
        let now = Utc::now();
        self.db.transaction(|txn| {
            let target = working.entity_ref();
            let (stored, storage_version) = read_stored::<E>(txn, &working)?;

            if !working.is_deleted() {
                working.prepare(txn)?;
            }
            let changed = make_diff(&stored.fields()?, &working.fields()?, false);
            if !changed.is_empty() {
                let names: Vec<&str> = changed.keys().map(String::as_str).collect();
                return Err(BanError::validation(format!(
                    "{} changed without a version increment: {}",
                    target,
                    names.join(", ")
                )));
            }

            working.meta_mut().audit.stamp_modified(actor, now);
            txn.cas(target.row_key(), storage_version, to_document(&working)?)
        })?;

        *entity = working;
        Ok(())
    }

    /// Persist with whichever path fits the entity state
    ///
    /// Unsaved entities are created, entities with a pending version get a
    /// new version, others are saved unversioned.
    pub fn save<E: VersionedEntity>(&self, actor: &Actor, entity: &mut E) -> BanResult<()> {
        if entity.version() == 0 {
            self.create(actor, entity)
        } else if entity.pending_version().is_some() {
            self.persist_new_version(actor, entity)
        } else {
            self.persist_unversioned(actor, entity)
        }
    }

    /// Soft-delete as a new version
    ///
    /// The entity keeps its row and its whole history. Its uniqueness
    /// slot is released.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if already deleted, otherwise as
    /// `persist_new_version`.
    pub fn mark_deleted<E: VersionedEntity>(&self, actor: &Actor, entity: &mut E) -> BanResult<()> {
        if entity.is_deleted() {
            return Err(BanError::invalid_operation(format!(
                "{} is already deleted",
                entity.entity_ref()
            )));
        }
        let mut working = entity.clone();
        working.meta_mut().deleted = true;
        working.increment_version(actor);
        self.persist_new_version(actor, &mut working)?;
        *entity = working;
        Ok(())
    }

    // ========== Read paths ==========

    /// Current row of an entity, soft-deleted or not
    ///
    /// # Errors
    ///
    /// `NotFound` if no row exists.
    pub fn get<E: VersionedEntity>(&self, id: EntityId) -> BanResult<E> {
        let key = Key::row(E::KIND, id);
        match self.db.storage().get(&key)? {
            Some(stored) => from_document(&stored.value),
            None => Err(BanError::not_found(key.entity_ref())),
        }
    }

    /// Live rows of a kind, in id order
    pub fn list<E: VersionedEntity>(&self) -> BanResult<Vec<E>> {
        Ok(self
            .list_with_deleted::<E>()?
            .into_iter()
            .filter(|e| !e.is_deleted())
            .collect())
    }

    /// All rows of a kind, soft-deleted ones included, in id order
    pub fn list_with_deleted<E: VersionedEntity>(&self) -> BanResult<Vec<E>> {
        self.db
            .storage()
            .scan_prefix(&KeyPrefix::table(E::KIND, KeySpace::Row), u64::MAX)?
            .into_iter()
            .map(|(_, stored)| from_document(&stored.value))
            .collect()
    }

    /// Read-only view pinned to the current snapshot
    pub fn view(&self) -> RegistryView {
        RegistryView::new(self.db.snapshot())
    }

    /// Ledger of an entity, pinned to the current snapshot
    ///
    /// Works for soft-deleted entities.
    ///
    /// # Errors
    ///
    /// `NotFound` if the entity was never created.
    pub fn versions<E: VersionedEntity>(&self, id: EntityId) -> BanResult<Versions> {
        self.view().versions::<E>(id)
    }

    /// Export views of a kind
    ///
    /// All rows and the relations they resolve are read from one snapshot.
    /// Soft-deleted entities are included only when
    /// `export.include_deleted` is set.
    pub fn export<E: VersionedEntity>(&self) -> BanResult<Vec<Fields>> {
        let include_deleted = self.db.config().export.include_deleted;
        self.view().export::<E>(include_deleted)
    }
}

/// Read the stored row being replaced and check it is the version `working`
/// was derived from
fn read_stored<E: VersionedEntity>(
    txn: &mut TransactionContext,
    working: &E,
) -> BanResult<(E, u64)> {
    let target = working.entity_ref();
    let (doc, storage_version) = txn
        .get_versioned(&target.row_key())?
        .ok_or_else(|| BanError::not_found(target))?;
    let stored: E = from_document(&doc)?;
    if stored.version() != working.version() {
        return Err(BanError::conflict(format!(
            "{} is at version {}, not {}",
            target,
            stored.version(),
            working.version()
        )));
    }
    Ok((stored, storage_version))
}

fn check_relations<E: VersionedEntity>(txn: &mut TransactionContext, entity: &E) -> BanResult<()> {
    for relation in entity.relations() {
        txn.require_live(relation)?;
    }
    Ok(())
}

/// Release the stored entity's uniqueness slot and take the working one's
///
/// Deleted entities hold no slot.
fn move_claim<E: VersionedEntity>(
    txn: &mut TransactionContext,
    stored: Option<&E>,
    working: &E,
) -> BanResult<()> {
    let held = stored.filter(|s| !s.is_deleted()).and_then(|s| s.unique_claim());
    let wanted = if working.is_deleted() {
        None
    } else {
        working.unique_claim()
    };
    if held == wanted {
        return Ok(());
    }

    if let Some((scope, claim)) = held {
        txn.delete(Key::unique(E::KIND, scope, &claim))?;
    }
    if let Some((scope, claim)) = wanted {
        let key = Key::unique(E::KIND, scope, &claim);
        match txn.claim_owner(&key)? {
            Some(owner) if owner == working.id() => {}
            Some(owner) => {
                return Err(BanError::validation(format!(
                    "{} '{}' already exists in {} (owned by {})",
                    E::KIND,
                    claim,
                    scope,
                    owner
                )))
            }
            None => txn.take_claim(key, working.id())?,
        }
    }
    Ok(())
}

fn log_appended<E: VersionedEntity>(entity: &E, diff_size: usize) {
    info!(
        target: "ban::ledger",
        kind = %E::KIND,
        id = %entity.id(),
        sequence = entity.version(),
        diff_size,
        "Ledger entry appended"
    );
}
