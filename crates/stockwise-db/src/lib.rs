//! # stockwise-db: Database Layer for Stockwise
//!
//! This crate provides persistence and the transactional ledger engine for
//! Stockwise. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Data Flow                              │
//! │                                                                         │
//! │  Backoffice command (ship_sales_order)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockwise-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    ledger     │    │  repository   │    │  migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ StockLedger   │───►│ ProductRepo   │    │              │  │   │
//! │  │   │ SalesFulfil.  │    │ HistoryRepo   │    │ 001_init.sql │  │   │
//! │  │   │ PurchaseFulf. │    │ SalesOrderRepo│    │              │  │   │
//! │  │   │ retry + tx    │    │ ...           │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           └────────┬───────────┘                               │   │
//! │  │                    ▼                                           │   │
//! │  │            Database (pool.rs)                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite Database (WAL mode)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Reads and master-data writes
//! - [`ledger`] - Every operation that moves stock or order status
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockwise_core::Session;
//! use stockwise_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockwise.db")).await?;
//! let session = Session::authenticated("user-1");
//!
//! let order = db.sales_fulfillment().ship(&session, &order_id).await?;
//! let low = db.products().list_low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::history::HistoryRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase_order::PurchaseOrderRepository;
pub use repository::sales_order::SalesOrderRepository;
pub use repository::supplier::SupplierRepository;

// Ledger re-exports
pub use ledger::{
    retry_on_conflict, AdjustmentOutcome, FinancialReports, PurchaseFulfillment, RetryPolicy,
    SalesFulfillment, StockAdjustments, StockChange, StockLedger,
};
