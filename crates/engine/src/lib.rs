//! Address registry engine
//!
//! This crate orchestrates all lower layers:
//! - Database: row store, transaction coordination, configuration
//! - Entities: the versioned entity contract and its variants
//! - Ledger: append-only per-entity history and reconstruction
//! - Registry: save paths (create, versioned, unversioned, soft delete),
//!   read paths and exports
//! - View: read-only registry view pinned to one snapshot
//! - Logging: tracing subscriber bootstrap
//!
//! The engine is the only component that knows about:
//! - Entity semantics (relations, uniqueness, derived fields)
//! - How a save maps onto rows, ledger keys and uniqueness claims

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;
pub mod entity;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod transaction_ops;
pub mod view;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use database::{BanConfig, Database, ExportConfig, CONFIG_FILE_NAME};
pub use entity::{
    Contact, EntityMeta, HouseNumber, Locality, Municipality, Position, PostCode, Street,
    VersionedEntity,
};
pub use ledger::{Historical, LedgerEntry, VersionIter, Versions};
pub use logging::init_tracing;
pub use registry::Registry;
pub use transaction_ops::RegistryTxnExt;
pub use view::RegistryView;
