//! # Stock Ledger
//!
//! `apply_stock_change` is the only sanctioned way to move `current_stock`.
//! Receiving, shipping and adjustments all end up in [`apply_in_tx`] so the
//! product write and its history line always commit together.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockwise_core::ledger::{ensure_direction, plan_movement};
use stockwise_core::validation::validate_note;
use stockwise_core::{ActorId, CoreResult, HistoryType, InventoryHistoryEntry, Money, Session};
use tracing::info;

use super::{begin, commit, retry_on_conflict, RetryPolicy};
use crate::repository::{history, product};

/// One requested stock change.
///
/// ## Example
/// ```rust,ignore
/// let change = StockChange::new(&product.id, -2, HistoryType::SupplierReturn)
///     .with_note("Damaged on arrival");
/// let entry = db.stock_ledger().apply_stock_change(&session, &change).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub product_id: String,
    pub delta: i64,
    pub movement_type: HistoryType,
    /// Required for `purchase-in`; ignored otherwise.
    pub unit_cost: Option<Money>,
    pub related_doc_id: Option<String>,
    pub note: Option<String>,
}

impl StockChange {
    pub fn new(product_id: impl Into<String>, delta: i64, movement_type: HistoryType) -> Self {
        StockChange {
            product_id: product_id.into(),
            delta,
            movement_type,
            unit_cost: None,
            related_doc_id: None,
            note: None,
        }
    }

    pub fn with_unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_related_doc(mut self, related_doc_id: impl Into<String>) -> Self {
        self.related_doc_id = Some(related_doc_id.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Direct access to the stock ledger.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        StockLedger { pool, retry }
    }

    /// Applies one signed stock change and appends its history entry.
    ///
    /// ## Errors
    /// - `Unauthorized` - anonymous session, nothing is read
    /// - `NotFound` - product does not exist
    /// - `InsufficientStock` - the change would take stock below zero
    /// - `Conflict` - lost the race on every retry
    pub async fn apply_stock_change(
        &self,
        session: &Session,
        change: &StockChange,
    ) -> CoreResult<InventoryHistoryEntry> {
        let actor = session.require_actor()?;
        validate_note(change.note.as_deref())?;
        ensure_direction(change.delta, change.movement_type)?;

        let entry = retry_on_conflict(self.retry, "apply_stock_change", move || {
            self.apply_once(actor, change)
        })
        .await?;

        info!(
            sku = %entry.sku,
            movement_type = %entry.movement_type,
            change = entry.change,
            stock_after = entry.stock_after,
            user = %actor,
            "Stock changed"
        );
        Ok(entry)
    }

    async fn apply_once(&self, actor: &ActorId, change: &StockChange) -> CoreResult<InventoryHistoryEntry> {
        let mut tx = begin(&self.pool).await?;
        let entry = apply_in_tx(&mut tx, change, actor, Utc::now()).await?;
        commit(tx).await?;
        Ok(entry)
    }
}

/// Reads the product inside the caller's transaction, plans the movement and
/// writes it. The building block every fulfillment flow composes.
pub(crate) async fn apply_in_tx(
    conn: &mut SqliteConnection,
    change: &StockChange,
    actor: &ActorId,
    at: DateTime<Utc>,
) -> CoreResult<InventoryHistoryEntry> {
    let current = product::require_product(conn, &change.product_id).await?;
    let movement = plan_movement(&current, change.delta, change.movement_type, change.unit_cost)?;

    let entry = history::record_movement(
        conn,
        &movement,
        change.related_doc_id.as_deref(),
        change.note.as_deref(),
        actor,
        at,
    )
    .await?;

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockwise_core::{CoreError, ProductDraft};

    async fn setup(opening_stock: i64, opening_cost_cents: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let draft = ProductDraft {
            sku: "CHAIR-01".into(),
            name: "Office Chair".into(),
            unit: "pcs".into(),
            is_active: true,
            opening_stock,
            opening_cost_cents,
            ..Default::default()
        };
        let product = db.products().upsert(&draft, &ActorId::new("u-1")).await.unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_purchase_in_moves_average_cost() {
        let (db, id) = setup(10, 10_000).await;
        let session = Session::authenticated("u-1");

        let change = StockChange::new(&id, 5, HistoryType::PurchaseIn)
            .with_unit_cost(Money::from_cents(13_000));
        let entry = db.stock_ledger().apply_stock_change(&session, &change).await.unwrap();

        assert_eq!(entry.stock_after, 15);
        assert_eq!(entry.cost_before_cents, Some(10_000));
        assert_eq!(entry.cost_after_cents, Some(11_000));

        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 15);
        assert_eq!(product.average_cost_cents, 11_000);
    }

    #[tokio::test]
    async fn test_return_keeps_average_cost() {
        let (db, id) = setup(10, 10_000).await;
        let session = Session::authenticated("u-1");

        let change = StockChange::new(&id, 2, HistoryType::CustomerReturn).with_note("Wrong colour");
        let entry = db.stock_ledger().apply_stock_change(&session, &change).await.unwrap();

        assert_eq!(entry.stock_after, 12);
        assert_eq!(entry.cost_after_cents, Some(10_000));
        assert_eq!(entry.note.as_deref(), Some("Wrong colour"));
    }

    #[tokio::test]
    async fn test_overdraw_writes_nothing() {
        let (db, id) = setup(3, 10_000).await;
        let session = Session::authenticated("u-1");

        let change = StockChange::new(&id, -4, HistoryType::SupplierReturn);
        let err = db.stock_ledger().apply_stock_change(&session, &change).await.unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { available: 3, requested: 4, .. }));
        assert_eq!(db.products().get_by_id(&id).await.unwrap().unwrap().current_stock, 3);
        assert_eq!(db.history().list_for_product(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_must_match_movement_type() {
        let (db, id) = setup(10, 10_000).await;
        let session = Session::authenticated("u-1");
        let ledger = db.stock_ledger();

        let outbound_purchase = StockChange::new(&id, -5, HistoryType::PurchaseIn).with_unit_cost(Money::zero());
        let inbound_supplier_return = StockChange::new(&id, 5, HistoryType::SupplierReturn);
        let outbound_customer_return = StockChange::new(&id, -1, HistoryType::CustomerReturn);

        for change in [&outbound_purchase, &inbound_supplier_return, &outbound_customer_return] {
            let err = ledger.apply_stock_change(&session, change).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{} {}", change.movement_type, change.delta);
        }

        let product = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 10);
        assert_eq!(product.average_cost_cents, 10_000);
        assert_eq!(db.history().list_for_product(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_session_is_rejected() {
        let (db, id) = setup(3, 0).await;

        let change = StockChange::new(&id, 1, HistoryType::CustomerReturn);
        let err = db
            .stock_ledger()
            .apply_stock_change(&Session::anonymous(), &change)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Unauthorized));
    }

    #[tokio::test]
    async fn test_missing_product() {
        let (db, _) = setup(0, 0).await;
        let session = Session::authenticated("u-1");

        let change = StockChange::new("missing", 1, HistoryType::CustomerReturn);
        let err = db.stock_ledger().apply_stock_change(&session, &change).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
