//! # Backoffice Commands
//!
//! Every action the presentation layer can trigger.
//!
//! ## Command Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Shapes                                       │
//! │                                                                         │
//! │  Reads                                                                  │
//! │  ─────                                                                  │
//! │  list_products(app) -> Vec<ProductDto>                                 │
//! │      failure → warn! + empty list (the screen still renders)           │
//! │                                                                         │
//! │  Writes                                                                 │
//! │  ──────                                                                 │
//! │  ship_sales_order(app, &session, id) -> Result<SalesOrder, ApiError>   │
//! │      anonymous session → UNAUTHORIZED before any read                  │
//! │      input validated before the store is touched                       │
//! │      every failure surfaces as an ApiError                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod inventory;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sales;
pub mod supplier;

use std::fmt::Display;

use tracing::warn;

/// Unwraps a read result, logging the failure and falling back to empty.
pub(crate) fn or_empty<T, E: Display>(operation: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(operation, error = %e, "Read failed, returning empty result");
            Vec::new()
        }
    }
}
