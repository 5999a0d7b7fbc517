//! # Purchase Fulfillment
//!
//! Purchase order lifecycle.
//!
//! ```text
//! create_order ──► pending-receipt ──receive──► completed
//!                        │                       (stock +qty per line,
//!                        │                        average cost recalculated)
//!                        └──────cancel─────────► cancelled (no stock effect)
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use stockwise_core::ledger::{line_subtotal, sum_amounts};
use stockwise_core::validation::validate_purchase_order_draft;
use stockwise_core::{
    ActorId, CoreError, CoreResult, HistoryType, Money, PurchaseOrder, PurchaseOrderAction,
    PurchaseOrderDraft, PurchaseOrderItem, PurchaseOrderStatus, Session, PURCHASE_ORDER_PREFIX,
};
use tracing::{info, warn};

use super::stock::{apply_in_tx, StockChange};
use super::{begin, commit, next_order_number, retry_on_conflict, RetryPolicy, ORDER_NUMBER_ATTEMPTS};
use crate::repository::purchase_order::{
    insert_purchase_order, mark_cancelled, mark_received, require_purchase_order,
};
use crate::repository::{generate_id, product, supplier};

#[derive(Debug, Clone)]
pub struct PurchaseFulfillment {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl PurchaseFulfillment {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        PurchaseFulfillment { pool, retry }
    }

    /// Creates a `pending-receipt` order, snapshotting the supplier and each
    /// product's sku, name and spec.
    ///
    /// ## Errors
    /// - `NotFound` - supplier or any product does not exist
    /// - `Validation` - empty order, non-positive quantity, negative cost
    pub async fn create_order(&self, session: &Session, draft: &PurchaseOrderDraft) -> CoreResult<PurchaseOrder> {
        let actor = session.require_actor()?;
        validate_purchase_order_draft(draft)?;

        let order = retry_on_conflict(self.retry, "create_purchase_order", move || {
            self.create_once(actor, draft)
        })
        .await?;

        info!(
            order_number = %order.order_number,
            lines = order.items.len(),
            total = %Money::from_cents(order.total_amount_cents),
            user = %actor,
            "Purchase order created"
        );
        Ok(order)
    }

    async fn create_once(&self, actor: &ActorId, draft: &PurchaseOrderDraft) -> CoreResult<PurchaseOrder> {
        let mut tx = begin(&self.pool).await?;

        let supplier = supplier::fetch_supplier(&mut tx, &draft.supplier_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Supplier", &draft.supplier_id))?;

        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let product = product::require_product(&mut tx, &line.product_id).await?;
            let unit_cost = Money::from_cents(line.unit_cost_cents);
            items.push(PurchaseOrderItem {
                product_id: product.id,
                sku: product.sku,
                name: product.name,
                spec: product.spec,
                quantity: line.quantity,
                unit_cost_cents: unit_cost.cents(),
                subtotal_cents: line_subtotal(unit_cost, line.quantity)?.cents(),
            });
        }

        let total_amount = sum_amounts("total_amount", items.iter().map(|i| Money::from_cents(i.subtotal_cents)))?;

        let now = Utc::now();
        let mut order = PurchaseOrder {
            id: generate_id(),
            order_number: next_order_number(PURCHASE_ORDER_PREFIX),
            supplier_id: supplier.id.clone(),
            supplier_info: supplier.snapshot(),
            total_amount_cents: total_amount.cents(),
            items,
            status: PurchaseOrderStatus::PendingReceipt,
            note: draft.note.clone(),
            created_by: actor.as_str().to_string(),
            received_by: None,
            created_at: now,
            updated_at: now,
            received_at: None,
            cancelled_at: None,
            version: 0,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match insert_purchase_order(&mut tx, &order).await {
                Ok(()) => break,
                Err(err)
                    if err.is_unique_violation_on("purchase_orders.order_number")
                        && attempts < ORDER_NUMBER_ATTEMPTS =>
                {
                    warn!(order_number = %order.order_number, "Order number taken, regenerating");
                    order.order_number = next_order_number(PURCHASE_ORDER_PREFIX);
                }
                Err(err) => return Err(err.into()),
            }
        }

        commit(tx).await?;
        Ok(order)
    }

    /// Receives every line of a pending order into stock.
    ///
    /// ## What This Does (one transaction)
    /// 1. Re-reads the order; it must be `pending-receipt`
    /// 2. Per line: `purchase-in` of `+quantity` at the line's unit cost,
    ///    which recalculates the weighted average cost
    /// 3. Marks the order `completed` with `received_by` / `received_at`
    ///
    /// A missing product aborts everything and leaves the order pending.
    /// Receiving a completed order fails with `InvalidStateTransition`, so
    /// stock is never received twice.
    pub async fn receive(&self, session: &Session, order_id: &str) -> CoreResult<PurchaseOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "receive_purchase_order", move || {
            self.receive_once(actor, order_id)
        })
        .await?;

        info!(
            order_number = %order.order_number,
            lines = order.items.len(),
            user = %actor,
            "Purchase order received"
        );
        Ok(order)
    }

    async fn receive_once(&self, actor: &ActorId, order_id: &str) -> CoreResult<PurchaseOrder> {
        let mut tx = begin(&self.pool).await?;

        let order = require_purchase_order(&mut tx, order_id).await?;
        ensure_transition(&order, PurchaseOrderAction::Receive)?;

        let now = Utc::now();
        for item in &order.items {
            let change = StockChange::new(&item.product_id, item.quantity, HistoryType::PurchaseIn)
                .with_unit_cost(item.unit_cost())
                .with_related_doc(&order.id)
                .with_note(format!("Purchase order {}", order.order_number));
            apply_in_tx(&mut tx, &change, actor, now).await?;
        }

        mark_received(&mut tx, &order, actor.as_str(), now).await?;
        let received = require_purchase_order(&mut tx, order_id).await?;

        commit(tx).await?;
        Ok(received)
    }

    /// Cancels a pending order. No stock effect.
    pub async fn cancel(&self, session: &Session, order_id: &str) -> CoreResult<PurchaseOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "cancel_purchase_order", move || {
            self.cancel_once(order_id)
        })
        .await?;

        info!(order_number = %order.order_number, user = %actor, "Purchase order cancelled");
        Ok(order)
    }

    async fn cancel_once(&self, order_id: &str) -> CoreResult<PurchaseOrder> {
        let mut tx = begin(&self.pool).await?;

        let order = require_purchase_order(&mut tx, order_id).await?;
        ensure_transition(&order, PurchaseOrderAction::Cancel)?;

        mark_cancelled(&mut tx, &order, Utc::now()).await?;
        let cancelled = require_purchase_order(&mut tx, order_id).await?;

        commit(tx).await?;
        Ok(cancelled)
    }
}

fn ensure_transition(order: &PurchaseOrder, action: PurchaseOrderAction) -> CoreResult<PurchaseOrderStatus> {
    order.status.next(action).ok_or_else(|| {
        CoreError::invalid_transition("PurchaseOrder", &order.id, order.status, action.as_str())
    })
}
