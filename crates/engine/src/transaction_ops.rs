//! Registry operations on a `TransactionContext`
//!
//! An extension trait so entity hooks (`prepare`) and the registry save
//! paths share one set of typed reads and writes. Every method buffers
//! into the surrounding transaction; nothing is visible before commit.
//!
//! ## Usage
//!
//! ```text
//! db.transaction(|txn| {
//!     let street: Option<Street> = txn.read_entity(street_id)?;
//!     txn.require_live(municipality_ref)?;
//!     txn.append_ledger(&entry)?;
//!     Ok(())
//! })?;
//! ```

use crate::entity::VersionedEntity;
use crate::ledger::LedgerEntry;
use ban_concurrency::TransactionContext;
use ban_core::value::{from_document, to_document};
use ban_core::{BanError, BanResult, Document, EntityId, EntityRef, Key};
use serde::{Deserialize, Serialize};

/// Stored body of a uniqueness claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Entity occupying the slot
    pub owner: EntityId,
}

/// Typed registry reads and writes inside a transaction
pub trait RegistryTxnExt {
    /// Read an entity row, seeing this transaction's own writes
    fn read_entity<E: VersionedEntity>(&mut self, id: EntityId) -> BanResult<Option<E>>;

    /// Read a row and fail with `Validation` unless it exists and is not
    /// soft-deleted
    fn require_live(&mut self, target: EntityRef) -> BanResult<Document>;

    /// Owner of a uniqueness claim, as committed before this transaction
    ///
    /// The observed claim version is recorded in the read set.
    fn claim_owner(&mut self, key: &Key) -> BanResult<Option<EntityId>>;

    /// Take a free uniqueness claim; conflicts at commit if someone else
    /// takes it first
    fn take_claim(&mut self, key: Key, owner: EntityId) -> BanResult<()>;

    /// Read one ledger entry
    fn ledger_entry(&mut self, entity: EntityRef, sequence: u64) -> BanResult<Option<LedgerEntry>>;

    /// Append a ledger entry; conflicts at commit if the sequence is taken
    fn append_ledger(&mut self, entry: &LedgerEntry) -> BanResult<()>;
}

impl RegistryTxnExt for TransactionContext {
    fn read_entity<E: VersionedEntity>(&mut self, id: EntityId) -> BanResult<Option<E>> {
        match self.get(&Key::row(E::KIND, id))? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    fn require_live(&mut self, target: EntityRef) -> BanResult<Document> {
        let doc = self.get(&target.row_key())?.ok_or_else(|| {
            BanError::validation(format!("related {} does not exist", target))
        })?;
        if doc.get("deleted").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(BanError::validation(format!(
                "related {} is deleted",
                target
            )));
        }
        Ok(doc)
    }

    fn claim_owner(&mut self, key: &Key) -> BanResult<Option<EntityId>> {
        match self.get_versioned(key)? {
            Some((doc, _)) => {
                let record: ClaimRecord = from_document(&doc)?;
                Ok(Some(record.owner))
            }
            None => Ok(None),
        }
    }

    fn take_claim(&mut self, key: Key, owner: EntityId) -> BanResult<()> {
        self.cas(key, 0, to_document(&ClaimRecord { owner })?)
    }

    fn ledger_entry(&mut self, entity: EntityRef, sequence: u64) -> BanResult<Option<LedgerEntry>> {
        match self.get(&entity.ledger_key(sequence))? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    fn append_ledger(&mut self, entry: &LedgerEntry) -> BanResult<()> {
        let key = entry.entity.ledger_key(entry.sequence);
        self.cas(key, 0, to_document(entry)?)
    }
}
