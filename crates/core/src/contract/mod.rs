//! Contract types shared by every layer
//!
//! - `versioned`: value + storage commit version + timestamp, returned by
//!   every storage read

pub mod versioned;

pub use versioned::Versioned;
