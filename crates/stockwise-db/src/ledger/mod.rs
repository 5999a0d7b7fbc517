//! # Ledger Engine
//!
//! The transactional side of Stockwise: every operation that changes stock
//! or moves an order through its lifecycle.
//!
//! ## Shape Of Every Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Ledger Operation                              │
//! │                                                                         │
//! │  session.require_actor()?          ← Unauthorized before any read      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  retry_on_conflict(policy, || async {                                  │
//! │       BEGIN                                                             │
//! │       read order / products        ← always inside the transaction     │
//! │       plan with stockwise_core::ledger (pure)                          │
//! │       write products (WHERE version = ?)                                │
//! │       append inventory_history                                         │
//! │       write order status           (WHERE version = ?)                  │
//! │       COMMIT                                                            │
//! │  })                                                                     │
//! │                                                                         │
//! │  Any error drops the transaction → ROLLBACK, nothing is written.       │
//! │  VersionConflict / SQLITE_BUSY → CoreError::Conflict → re-run.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`stock`] - `apply_stock_change`, the single path that moves stock
//! - [`purchase`] - create / receive / cancel purchase orders
//! - [`sales`] - create / approve / cancel / ship sales orders, payment status
//! - [`adjustment`] - stocktake adjustments, single and batched
//! - [`report`] - financial summary and customer statements (read only)
//! - [`retry`] - bounded retry on conflict

pub mod adjustment;
pub mod purchase;
pub mod report;
pub mod retry;
pub mod sales;
pub mod stock;

pub use adjustment::{AdjustmentOutcome, StockAdjustments};
pub use purchase::PurchaseFulfillment;
pub use report::FinancialReports;
pub use retry::{retry_on_conflict, RetryPolicy};
pub use sales::SalesFulfillment;
pub use stock::{StockChange, StockLedger};

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use stockwise_core::ledger::format_order_number;
use stockwise_core::{CoreError, CoreResult};
use uuid::Uuid;

use crate::error::DbError;

/// Order number collisions tolerated before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

pub(crate) async fn begin(pool: &SqlitePool) -> CoreResult<Transaction<'static, Sqlite>> {
    pool.begin()
        .await
        .map_err(|e| CoreError::from(DbError::from(e)))
}

pub(crate) async fn commit(tx: Transaction<'static, Sqlite>) -> CoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| CoreError::from(DbError::from(e)))
}

/// A fresh `PREFIX-YYYYMMDD-XXXX` number for today (UTC).
pub(crate) fn next_order_number(prefix: &str) -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let entropy = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format_order_number(prefix, Utc::now().date_naive(), entropy)
}
