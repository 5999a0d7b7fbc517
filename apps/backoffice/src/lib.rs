//! # Stockwise Backoffice
//!
//! The caller-facing layer: opens the database, holds configuration, and
//! exposes one command per backoffice action.
//!
//! ## Module Organization
//! ```text
//! stockwise_backoffice/
//! ├── lib.rs          ◄─── You are here (Backoffice handle)
//! ├── config.rs       ◄─── AppConfig (defaults, stockwise.toml, env)
//! ├── logging.rs      ◄─── tracing subscriber setup
//! ├── error.rs        ◄─── ApiError returned by every command
//! └── commands/
//!     ├── product.rs   ◄─── products, low stock
//!     ├── customer.rs  ◄─── customers
//!     ├── supplier.rs  ◄─── suppliers
//!     ├── inventory.rs ◄─── history, adjustments, returns
//!     ├── purchase.rs  ◄─── purchase orders
//!     ├── sales.rs     ◄─── sales orders
//!     └── report.rs    ◄─── financial summary, statements
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Backoffice Startup                                │
//! │                                                                         │
//! │  1. AppConfig::load()  defaults → stockwise.toml → STOCKWISE_*         │
//! │  2. init_tracing()     RUST_LOG overrides config.log_level             │
//! │  3. Backoffice::open() SQLite (WAL) + pending migrations               │
//! │  4. commands::*        every write takes an explicit &Session          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

use stockwise_db::Database;
use tracing::info;

pub use config::AppConfig;
pub use error::{ApiError, ErrorCode};

/// Shared handle every command receives.
///
/// Cloning is cheap; the database pool is reference counted.
#[derive(Debug, Clone)]
pub struct Backoffice {
    db: Database,
    config: AppConfig,
}

impl Backoffice {
    /// Connects to the configured database and applies pending migrations.
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path.display(), "Backoffice ready");
        Ok(Backoffice { db, config })
    }

    /// Wraps an already-open database.
    pub fn with_database(db: Database, config: AppConfig) -> Self {
        Backoffice { db, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use stockwise_core::Session;
    use stockwise_db::DbConfig;

    pub async fn backoffice() -> Backoffice {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Backoffice::with_database(db, AppConfig::default())
    }

    pub fn clerk() -> Session {
        Session::authenticated("clerk-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_and_migrates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("backoffice.db"),
            max_connections: 2,
            ..AppConfig::default()
        };

        let app = Backoffice::open(config).await.unwrap();
        assert!(app.db().health_check().await);
        assert_eq!(app.config().max_connections, 2);
        assert!(dir.path().join("backoffice.db").exists());

        app.close().await;
    }
}
