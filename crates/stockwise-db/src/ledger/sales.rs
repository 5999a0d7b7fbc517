//! # Sales Fulfillment
//!
//! Sales order lifecycle, including the shipment transaction.
//!
//! ## Shipping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ship(order_id), one transaction                     │
//! │                                                                         │
//! │  1. read order            must be pending-shipment                     │
//! │  2. PRE-VALIDATE          sum quantities per product, compare against  │
//! │                           current stock; any shortfall → abort with    │
//! │                           InsufficientStock(sku), nothing written      │
//! │  3. per line              unit_cost = product.average_cost (now)       │
//! │                           sales-out  -quantity  → history entry         │
//! │  4. costing               total_cost   = Σ qty × unit_cost             │
//! │                           gross_profit = total_amount - total_cost     │
//! │  5. order                 completed, shipped_by, shipped_at            │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use stockwise_core::ledger::{aggregate_quantities, cost_shipment, ensure_available, line_subtotal, sum_amounts};
use stockwise_core::validation::validate_sales_order_draft;
use stockwise_core::{
    ActorId, CoreError, CoreResult, HistoryType, Money, PaymentStatus, SalesOrder,
    SalesOrderAction, SalesOrderDraft, SalesOrderItem, SalesOrderStatus, Session,
    SALES_ORDER_PREFIX,
};
use tracing::{info, warn};

use super::stock::{apply_in_tx, StockChange};
use super::{begin, commit, next_order_number, retry_on_conflict, RetryPolicy, ORDER_NUMBER_ATTEMPTS};
use crate::repository::sales_order::{
    insert_sales_order, mark_shipped, require_sales_order, update_payment_status, update_status,
};
use crate::repository::{customer, generate_id, product};

#[derive(Debug, Clone)]
pub struct SalesFulfillment {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl SalesFulfillment {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        SalesFulfillment { pool, retry }
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Creates a `pending-approval` order.
    ///
    /// Lines without a unit price use the product's price for the customer's
    /// tier. The customer snapshot and the shipping address (defaulting to the
    /// customer's address) are frozen onto the order.
    pub async fn create_order(&self, session: &Session, draft: &SalesOrderDraft) -> CoreResult<SalesOrder> {
        let actor = session.require_actor()?;
        validate_sales_order_draft(draft)?;

        let order = retry_on_conflict(self.retry, "create_sales_order", move || {
            self.create_once(actor, draft)
        })
        .await?;

        info!(
            order_number = %order.order_number,
            customer = %order.customer_info.name,
            total = %order.total_amount(),
            user = %actor,
            "Sales order created"
        );
        Ok(order)
    }

    async fn create_once(&self, actor: &ActorId, draft: &SalesOrderDraft) -> CoreResult<SalesOrder> {
        let mut tx = begin(&self.pool).await?;

        let customer = customer::fetch_customer(&mut tx, &draft.customer_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Customer", &draft.customer_id))?;

        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            let product = product::require_product(&mut tx, &line.product_id).await?;
            let unit_price = line
                .unit_price_cents
                .map(Money::from_cents)
                .unwrap_or_else(|| product.price_for(customer.level));

            items.push(SalesOrderItem {
                product_id: product.id,
                sku: product.sku,
                name: product.name,
                spec: product.spec,
                quantity: line.quantity,
                unit_price_cents: unit_price.cents(),
                subtotal_cents: line_subtotal(unit_price, line.quantity)?.cents(),
                unit_cost_cents: None,
            });
        }

        let total_amount = sum_amounts("total_amount", items.iter().map(|i| Money::from_cents(i.subtotal_cents)))?;

        let now = Utc::now();
        let mut order = SalesOrder {
            id: generate_id(),
            order_number: next_order_number(SALES_ORDER_PREFIX),
            customer_id: customer.id.clone(),
            customer_info: customer.snapshot(),
            shipping_address: draft.shipping_address.clone().or_else(|| customer.address.clone()),
            total_amount_cents: total_amount.cents(),
            items,
            total_cost_cents: None,
            gross_profit_cents: None,
            status: SalesOrderStatus::PendingApproval,
            payment_status: PaymentStatus::Unpaid,
            invoice_number: draft.invoice_number.clone(),
            shipping_note: draft.shipping_note.clone(),
            internal_note: draft.internal_note.clone(),
            created_by: actor.as_str().to_string(),
            approved_by: None,
            shipped_by: None,
            created_at: now,
            updated_at: now,
            approved_at: None,
            shipped_at: None,
            cancelled_at: None,
            version: 0,
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match insert_sales_order(&mut tx, &order).await {
                Ok(()) => break,
                Err(err)
                    if err.is_unique_violation_on("sales_orders.order_number")
                        && attempts < ORDER_NUMBER_ATTEMPTS =>
                {
                    warn!(order_number = %order.order_number, "Order number taken, regenerating");
                    order.order_number = next_order_number(SALES_ORDER_PREFIX);
                }
                Err(err) => return Err(err.into()),
            }
        }

        commit(tx).await?;
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Approve / Cancel
    // -------------------------------------------------------------------------

    /// `pending-approval` → `pending-shipment`, recording the approver.
    pub async fn approve(&self, session: &Session, order_id: &str) -> CoreResult<SalesOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "approve_sales_order", move || {
            self.transition_once(actor, order_id, SalesOrderAction::Approve)
        })
        .await?;

        info!(order_number = %order.order_number, user = %actor, "Sales order approved");
        Ok(order)
    }

    /// Cancels an order that has not shipped. No stock effect, no history.
    pub async fn cancel(&self, session: &Session, order_id: &str) -> CoreResult<SalesOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "cancel_sales_order", move || {
            self.transition_once(actor, order_id, SalesOrderAction::Cancel)
        })
        .await?;

        info!(order_number = %order.order_number, user = %actor, "Sales order cancelled");
        Ok(order)
    }

    async fn transition_once(
        &self,
        actor: &ActorId,
        order_id: &str,
        action: SalesOrderAction,
    ) -> CoreResult<SalesOrder> {
        let mut tx = begin(&self.pool).await?;

        let order = require_sales_order(&mut tx, order_id).await?;
        let next = ensure_transition(&order, action)?;

        update_status(&mut tx, &order, next, actor.as_str(), Utc::now()).await?;
        let updated = require_sales_order(&mut tx, order_id).await?;

        commit(tx).await?;
        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Ship
    // -------------------------------------------------------------------------

    /// Ships a `pending-shipment` order in one all-or-nothing transaction.
    ///
    /// ## Errors
    /// - `InvalidStateTransition` - order is not pending shipment
    /// - `InsufficientStock` - any product is short; names the first short
    ///   SKU, no stock is touched and the order stays `pending-shipment`
    /// - `NotFound` - order or one of its products does not exist
    /// - `Conflict` - lost the race to another writer on every retry
    pub async fn ship(&self, session: &Session, order_id: &str) -> CoreResult<SalesOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "ship_sales_order", move || {
            self.ship_once(actor, order_id)
        })
        .await?;

        info!(
            order_number = %order.order_number,
            total = %order.total_amount(),
            total_cost = order.total_cost_cents.unwrap_or_default(),
            gross_profit = order.gross_profit_cents.unwrap_or_default(),
            user = %actor,
            "Sales order shipped"
        );
        Ok(order)
    }

    async fn ship_once(&self, actor: &ActorId, order_id: &str) -> CoreResult<SalesOrder> {
        let mut tx = begin(&self.pool).await?;

        let mut order = require_sales_order(&mut tx, order_id).await?;
        let next = ensure_transition(&order, SalesOrderAction::Ship)?;

        // Pre-validate the whole order before the first write.
        let requested = aggregate_quantities(order.items.iter().map(|i| (i.product_id.as_str(), i.quantity)));
        for (product_id, quantity) in &requested {
            let current = product::require_product(&mut tx, product_id).await?;
            ensure_available(&current, *quantity)?;
        }

        let now = Utc::now();
        let note = format!("Sales order {}", order.order_number);
        for item in order.items.iter_mut() {
            let change = StockChange::new(&item.product_id, -item.quantity, HistoryType::SalesOut)
                .with_related_doc(&order.id)
                .with_note(note.as_str());
            let entry = apply_in_tx(&mut tx, &change, actor, now).await?;
            item.unit_cost_cents = entry.cost_before_cents;
        }

        let costing = cost_shipment(
            order.total_amount(),
            order
                .items
                .iter()
                .map(|i| (i.quantity, Money::from_cents(i.unit_cost_cents.unwrap_or_default()))),
        )?;

        order.status = next;
        order.total_cost_cents = Some(costing.total_cost.cents());
        order.gross_profit_cents = Some(costing.gross_profit.cents());
        order.shipped_by = Some(actor.as_str().to_string());
        order.shipped_at = Some(now);

        mark_shipped(&mut tx, &order).await?;
        let shipped = require_sales_order(&mut tx, order_id).await?;

        commit(tx).await?;
        Ok(shipped)
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// Records the payment state. Allowed in any status except `cancelled`.
    pub async fn update_payment_status(
        &self,
        session: &Session,
        order_id: &str,
        payment_status: PaymentStatus,
    ) -> CoreResult<SalesOrder> {
        let actor = session.require_actor()?;

        let order = retry_on_conflict(self.retry, "update_payment_status", move || {
            self.payment_once(order_id, payment_status)
        })
        .await?;

        info!(
            order_number = %order.order_number,
            payment_status = ?order.payment_status,
            user = %actor,
            "Payment status updated"
        );
        Ok(order)
    }

    async fn payment_once(&self, order_id: &str, payment_status: PaymentStatus) -> CoreResult<SalesOrder> {
        let mut tx = begin(&self.pool).await?;

        let order = require_sales_order(&mut tx, order_id).await?;
        if order.status == SalesOrderStatus::Cancelled {
            return Err(CoreError::invalid_transition(
                "SalesOrder",
                &order.id,
                order.status,
                "update payment",
            ));
        }

        update_payment_status(&mut tx, &order, payment_status, Utc::now()).await?;
        let updated = require_sales_order(&mut tx, order_id).await?;

        commit(tx).await?;
        Ok(updated)
    }
}

fn ensure_transition(order: &SalesOrder, action: SalesOrderAction) -> CoreResult<SalesOrderStatus> {
    order.status.next(action).ok_or_else(|| {
        CoreError::invalid_transition("SalesOrder", &order.id, order.status, action.as_str())
    })
}
