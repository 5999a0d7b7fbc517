//! # Inventory Commands
//!
//! History listings, stocktake adjustments and manual returns.
//!
//! ## Stocktake Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Counted shelf: CHAIR-01 = 7         System: current_stock = 10        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  adjust_stock(product_id, 7, "Cycle count")                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  history: adjustment  change -3  stock_after 7  note "Cycle count"     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A batch stocktake runs each line on its own. The response lists one
//! outcome per line in request order.

use serde::Serialize;
use stockwise_core::validation::validate_quantity;
use stockwise_core::{AdjustmentDraft, HistoryType, InventoryHistoryEntry, Session};
use stockwise_db::{AdjustmentOutcome, StockChange};

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

/// Outcome of one batch line, serializable for the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentResultDto {
    pub product_id: String,
    pub entry: Option<InventoryHistoryEntry>,
    pub error: Option<ApiError>,
}

impl From<AdjustmentOutcome> for AdjustmentResultDto {
    fn from(outcome: AdjustmentOutcome) -> Self {
        match outcome.result {
            Ok(entry) => AdjustmentResultDto {
                product_id: outcome.product_id,
                entry: Some(entry),
                error: None,
            },
            Err(e) => AdjustmentResultDto {
                product_id: outcome.product_id,
                entry: None,
                error: Some(e.into()),
            },
        }
    }
}

/// The whole ledger, newest first. `limit` caps the number of entries.
pub async fn list_inventory_history(app: &Backoffice, limit: Option<u32>) -> Vec<InventoryHistoryEntry> {
    or_empty("list_inventory_history", app.db().history().list(limit).await)
}

/// One product's ledger, newest first.
pub async fn product_history(app: &Backoffice, product_id: &str) -> Vec<InventoryHistoryEntry> {
    or_empty("product_history", app.db().history().list_for_product(product_id).await)
}

/// Sets a product's stock to exactly `new_stock`.
pub async fn adjust_stock(
    app: &Backoffice,
    session: &Session,
    product_id: &str,
    new_stock: i64,
    note: Option<&str>,
) -> Result<InventoryHistoryEntry, ApiError> {
    let entry = app
        .db()
        .adjustments()
        .adjust_stock(session, product_id, new_stock, note)
        .await?;
    Ok(entry)
}

/// Applies several stocktake lines; a failing line does not stop the rest.
pub async fn adjust_stock_batch(
    app: &Backoffice,
    session: &Session,
    lines: &[AdjustmentDraft],
) -> Result<Vec<AdjustmentResultDto>, ApiError> {
    let outcomes = app.db().adjustments().adjust_stock_batch(session, lines).await?;
    Ok(outcomes.into_iter().map(AdjustmentResultDto::from).collect())
}

/// Goods a customer brought back. Stock goes up, average cost is unchanged.
pub async fn record_customer_return(
    app: &Backoffice,
    session: &Session,
    product_id: &str,
    quantity: i64,
    note: Option<&str>,
) -> Result<InventoryHistoryEntry, ApiError> {
    record_return(app, session, product_id, quantity, HistoryType::CustomerReturn, note).await
}

/// Goods sent back to a supplier. Stock goes down, average cost is unchanged.
pub async fn record_supplier_return(
    app: &Backoffice,
    session: &Session,
    product_id: &str,
    quantity: i64,
    note: Option<&str>,
) -> Result<InventoryHistoryEntry, ApiError> {
    record_return(app, session, product_id, quantity, HistoryType::SupplierReturn, note).await
}

async fn record_return(
    app: &Backoffice,
    session: &Session,
    product_id: &str,
    quantity: i64,
    movement_type: HistoryType,
    note: Option<&str>,
) -> Result<InventoryHistoryEntry, ApiError> {
    validate_quantity(quantity).map_err(|e| ApiError::validation(e.to_string()))?;

    let delta = match movement_type {
        HistoryType::SupplierReturn => -quantity,
        _ => quantity,
    };

    let mut change = StockChange::new(product_id, delta, movement_type);
    if let Some(note) = note {
        change = change.with_note(note);
    }

    let entry = app.db().stock_ledger().apply_stock_change(session, &change).await?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::save_product;
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};
    use stockwise_core::{ProductDraft, MAX_LINE_QUANTITY};

    async fn chair(app: &Backoffice, stock: i64) -> String {
        let draft = ProductDraft {
            sku: "CHAIR-01".into(),
            name: "Office Chair".into(),
            unit: "pcs".into(),
            is_active: true,
            opening_stock: stock,
            opening_cost_cents: 10_000,
            ..Default::default()
        };
        save_product(app, &clerk(), &draft).await.unwrap()
    }

    #[tokio::test]
    async fn test_adjust_then_history() {
        let app = backoffice().await;
        let id = chair(&app, 10).await;

        let entry = adjust_stock(&app, &clerk(), &id, 7, Some("Cycle count")).await.unwrap();
        assert_eq!(entry.change, -3);

        let history = product_history(&app, &id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].stock_after, 7);
        assert_eq!(list_inventory_history(&app, Some(1)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_stocktake_target_shares_opening_stock_ceiling() {
        let app = backoffice().await;
        let id = chair(&app, 10).await;
        let ceiling = MAX_LINE_QUANTITY * 1000;

        let err = adjust_stock(&app, &clerk(), &id, ceiling + 1, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(product_history(&app, &id).await.len(), 1);

        let entry = adjust_stock(&app, &clerk(), &id, ceiling, None).await.unwrap();
        assert_eq!(entry.stock_after, ceiling);
    }

    #[tokio::test]
    async fn test_batch_reports_failed_lines() {
        let app = backoffice().await;
        let id = chair(&app, 10).await;

        let lines = vec![
            AdjustmentDraft {
                product_id: id.clone(),
                new_stock: -5,
                note: None,
            },
            AdjustmentDraft {
                product_id: id.clone(),
                new_stock: 4,
                note: None,
            },
        ];

        let results = adjust_stock_batch(&app, &clerk(), &lines).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].error.as_ref().map(|e| e.code), Some(ErrorCode::InsufficientStock));
        assert_eq!(results[1].entry.as_ref().map(|e| e.stock_after), Some(4));
    }

    #[tokio::test]
    async fn test_returns_move_stock_both_ways() {
        let app = backoffice().await;
        let id = chair(&app, 5).await;

        let entry = record_customer_return(&app, &clerk(), &id, 2, None).await.unwrap();
        assert_eq!(entry.movement_type, HistoryType::CustomerReturn);
        assert_eq!(entry.stock_after, 7);

        let entry = record_supplier_return(&app, &clerk(), &id, 3, Some("Damaged")).await.unwrap();
        assert_eq!(entry.change, -3);
        assert_eq!(entry.stock_after, 4);

        let err = record_supplier_return(&app, &clerk(), &id, 10, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = record_customer_return(&app, &clerk(), &id, 0, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
