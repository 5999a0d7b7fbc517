//! # Backoffice Configuration
//!
//! Loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKWISE_*`, e.g. `STOCKWISE_DATABASE_PATH`)
//! 2. Config file (`stockwise.toml` in the working directory, optional)
//! 3. Defaults (this file)
//!
//! Configuration is read-only after loading, so no locking is needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use stockwise_core::Money;
use stockwise_db::{DbConfig, RetryPolicy};

/// Backoffice configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size. Writers serialize on SQLite's lock, readers run in parallel.
    pub max_connections: u32,

    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Attempts per ledger operation before a conflict is surfaced.
    pub retry_attempts: u32,

    /// First retry delay in milliseconds; doubles per attempt.
    pub retry_backoff_ms: u64,

    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Symbol used when amounts are printed.
    pub currency_symbol: String,
}

impl Default for AppConfig {
    /// Development defaults: a database in the working directory, INFO logs.
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("stockwise.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
            retry_attempts: 5,
            retry_backoff_ms: 20,
            log_level: "info,stockwise=debug,sqlx=warn".to_string(),
            log_json: false,
            currency_symbol: "$".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `stockwise.toml` (if present) and `STOCKWISE_*` overrides on top
    /// of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("stockwise.toml"))
    }

    /// Same as [`AppConfig::load`] with an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("STOCKWISE").try_parsing(true))
            .build()?
            .try_deserialize::<AppConfig>()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Message("max_connections must be at least 1".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Message("database_path is required".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .retry(self.retry_policy())
    }

    /// Formats an amount with the configured currency symbol, e.g. `€1234.50`.
    pub fn display_money(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            self.currency_symbol,
            amount.dollars().abs(),
            amount.cents_part().abs()
        )
    }
}
