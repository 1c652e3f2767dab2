//! Generic versioned wrapper type
//!
//! Every read from storage returns data wrapped in `Versioned<T>`: the value,
//! the storage commit version that wrote it and the commit timestamp.
//!
//! The commit version is the optimistic-concurrency token. A transaction
//! remembers the version it read and the commit fails if the row was
//! rewritten in between.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value with its storage version information
///
/// ## Invariants
///
/// - `version` always matches the commit that wrote this data
/// - `timestamp` is the commit time of that version
/// - Value is never modified after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The actual value
    pub value: T,

    /// Storage commit version
    pub version: u64,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

impl<T> Versioned<T> {
    /// Create a new versioned value with current timestamp
    pub fn new(value: T, version: u64) -> Self {
        Versioned {
            value,
            version,
            timestamp: Utc::now(),
        }
    }

    /// Create a versioned value with explicit timestamp
    pub fn with_timestamp(value: T, version: u64, timestamp: DateTime<Utc>) -> Self {
        Versioned {
            value,
            version,
            timestamp,
        }
    }

    /// Map the inner value to a new type
    pub fn map<U, F>(self, f: F) -> Versioned<U>
    where
        F: FnOnce(T) -> U,
    {
        Versioned {
            value: f(self.value),
            version: self.version,
            timestamp: self.timestamp,
        }
    }

    /// Get a reference to the inner value
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume and return the inner value
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get the version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T> AsRef<T> for Versioned<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_versioned_new() {
        let v = Versioned::new(42i32, 1);
        assert_eq!(v.value, 42);
        assert_eq!(v.version, 1);
    }

    #[test]
    fn test_versioned_map_keeps_metadata() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let v = Versioned::with_timestamp(5i32, 9, ts);
        let v2 = v.map(|n| n * 2);

        assert_eq!(v2.value, 10);
        assert_eq!(v2.version, 9);
        assert_eq!(v2.timestamp, ts);
    }

    #[test]
    fn test_versioned_equality() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let v1 = Versioned::with_timestamp("a", 1, ts);
        let v2 = Versioned::with_timestamp("a", 1, ts);
        let v3 = Versioned::with_timestamp("a", 2, ts);

        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
    }
}
