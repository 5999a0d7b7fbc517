//! # Repository Module
//!
//! Database repository implementations for Stockwise.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Access Paths                              │
//! │                                                                         │
//! │  Backoffice list/get/upsert                Ledger engine               │
//! │       │                                         │                       │
//! │       │  db.products().list(false)              │  BEGIN               │
//! │       ▼                                         ▼                       │
//! │  ProductRepository (holds SqlitePool)    product::require_product(tx)  │
//! │       │                                  product::update_stock_level   │
//! │       │  acquires a connection           history::record_movement      │
//! │       ▼                                         │  COMMIT               │
//! │  connection-level functions  ◄──────────────────┘                       │
//! │  (fn xxx(conn: &mut SqliteConnection, ...))                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every SQL statement lives in this module. The pool-holding structs    │
//! │  serve single-statement reads and edits; the crate-private functions   │
//! │  run on a caller's transaction so a ledger step sees its own writes.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, low-stock listing
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier CRUD
//! - [`HistoryRepository`](history::HistoryRepository) - Append-only inventory ledger
//! - [`PurchaseOrderRepository`](purchase_order::PurchaseOrderRepository) - Purchase orders + items
//! - [`SalesOrderRepository`](sales_order::SalesOrderRepository) - Sales orders + items

pub mod customer;
pub mod history;
pub mod product;
pub mod purchase_order;
pub mod sales_order;
pub mod supplier;

use stockwise_core::Address;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new storage key.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// Addresses are stored as a JSON object in a TEXT column.

pub(crate) fn encode_address(address: Option<&Address>) -> DbResult<Option<String>> {
    address
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DbError::decode("address", e))
}

pub(crate) fn decode_address(raw: Option<&str>) -> DbResult<Option<Address>> {
    match raw {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| DbError::decode("address", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_json_round_trip() {
        let address = Address {
            zip_code: "100".into(),
            city: "Taipei".into(),
            district: "Zhongzheng".into(),
            street: "1 Main Rd".into(),
        };

        let raw = encode_address(Some(&address)).unwrap().unwrap();
        assert!(raw.contains("\"zipCode\":\"100\""));
        assert_eq!(decode_address(Some(&raw)).unwrap(), Some(address));
        assert_eq!(decode_address(None).unwrap(), None);
        assert_eq!(decode_address(Some("")).unwrap(), None);
    }

    #[test]
    fn test_corrupt_address_is_a_decode_error() {
        let err = decode_address(Some("{not json")).unwrap_err();
        assert!(matches!(err, DbError::Decode { ref column, .. } if column == "address"));
    }
}
