//! Registry conformance suite
//!
//! End-to-end checks of the public `ban` surface: version numbering,
//! history reconstruction, diffs, CIA derivation, scoped uniqueness,
//! centers, racing saves and configuration.

#[path = "../common/mod.rs"]
mod common;

mod config;
mod diff_and_cia;
mod history;
mod racing;
mod uniqueness;
