//! # stockwise-core: Pure Ledger Logic for Stockwise
//!
//! This crate is the **heart** of Stockwise. It holds the inventory ledger
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Backoffice (apps/backoffice)                    │   │
//! │  │   list_products, receive_purchase_order, ship_sales_order ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockwise-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ StockMove │  │   rules   │  │   │
//! │  │   │ SalesOrder│  │ avg cost  │  │  Summary  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockwise-db (Database Layer)                   │   │
//! │  │      SQLite repositories, transactions, ledger engine           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, SalesOrder, InventoryHistoryEntry, ...)
//! - [`money`] - Money type with integer arithmetic and half-up division
//! - [`ledger`] - Stock movement planning and financial summary math
//! - [`session`] - Explicit actor context passed into every write
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockwise_core::money::Money;
//!
//! // 10 units at $100.00 plus 5 units at $130.00
//! let avg = Money::weighted_average(10, Money::from_cents(10_000), 5, Money::from_cents(13_000));
//! assert_eq!(avg.cents(), 11_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use session::{ActorId, Session};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of generated sales order numbers (`SO-20240115-7KQ2`).
pub const SALES_ORDER_PREFIX: &str = "SO";

/// Prefix of generated purchase order numbers (`PO-20240115-A03Z`).
pub const PURCHASE_ORDER_PREFIX: &str = "PO";

/// Maximum number of line items on a single order.
///
/// ## Business Reason
/// Keeps a single fulfillment transaction to a reasonable number of
/// product updates and history rows.
pub const MAX_ORDER_LINES: usize = 200;

/// Maximum quantity of a single order line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Maximum unit price or cost in cents (100,000,000.00).
///
/// With `MAX_LINE_QUANTITY` and `MAX_ORDER_LINES` this keeps every order
/// total inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;
