//! Tracing subscriber setup
//!
//! Targets emitted by the registry:
//! - `ban::txn`: transaction begin/commit (debug) and abort (warn)
//! - `ban::ledger`: ledger entry appended (info)
//! - `ban::storage`: batch application (trace)

use ban_core::{BanError, BanResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::database::BanConfig;

/// Build the filter: `RUST_LOG` when set and valid, else the configured filter
pub fn env_filter(config: &BanConfig) -> BanResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| {
            BanError::validation(format!("invalid log filter '{}': {}", config.log_filter, e))
        })
}

/// Install a global fmt subscriber
///
/// Returns `InvalidOperation` instead of panicking when a global
/// subscriber is already installed, so calling it twice is harmless.
pub fn init_tracing(config: &BanConfig) -> BanResult<()> {
    let filter = env_filter(config)?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| BanError::invalid_operation(format!("tracing already initialized: {}", e)))?;

    tracing::info!(target: "ban::db", filter = %config.log_filter, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_returns_error() {
        let config = BanConfig::default();
        // The first call may lose against another test's subscriber;
        // either way a second call cannot succeed.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn test_default_filter_is_valid() {
        assert!(env_filter(&BanConfig::default()).is_ok());
    }
}
