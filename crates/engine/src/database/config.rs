//! Registry configuration via `ban.toml`
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use ban_core::{BanError, BanResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "ban.toml";

/// Export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Include soft-deleted entities in exports
    #[serde(default)]
    pub include_deleted: bool,
}

/// Registry configuration loaded from `ban.toml`.
///
/// # Example
///
/// ```toml
/// log_filter = "info,ban::ledger=debug"
/// transaction_timeout_ms = 5000
///
/// [export]
/// include_deleted = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BanConfig {
    /// Fallback `tracing` filter when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Transactions older than this at commit time are aborted
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_transaction_timeout_ms() -> u64 {
    5000
}

impl Default for BanConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
            export: ExportConfig::default(),
        }
    }
}

impl BanConfig {
    /// Transaction timeout as a `Duration`
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Address registry configuration
#
# Log filter used when RUST_LOG is not set (tracing EnvFilter syntax)
log_filter = "info"

# Transactions still uncommitted after this many milliseconds are aborted
transaction_timeout_ms = 5000

[export]
# Include soft-deleted entities in exports (default: false)
include_deleted = false
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> BanResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BanError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: BanConfig = toml::from_str(&content).map_err(|e| {
            BanError::validation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        if config.transaction_timeout_ms == 0 {
            return Err(BanError::validation(format!(
                "transaction_timeout_ms must be positive in '{}'",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> BanResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                BanError::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> BanResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BanError::serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            BanError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
