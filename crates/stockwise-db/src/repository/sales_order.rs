//! # Sales Order Repository
//!
//! Sales order headers and their items.
//!
//! ## Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales_orders                                                          │
//! │  ├── customer_name / customer_level / customer_tax_id  (snapshot)      │
//! │  ├── shipping_address                                  (JSON text)     │
//! │  ├── total_cost_cents / gross_profit_cents             (NULL until     │
//! │  │                                                      shipped)       │
//! │  └── version                                           (optimistic)    │
//! │                                                                         │
//! │  sales_order_items  (order_id, line_no)                                │
//! │  └── unit_cost_cents                                   (NULL until     │
//! │                                                         shipped)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use stockwise_core::{
    CustomerSnapshot, PaymentStatus, PriceTier, SalesOrder, SalesOrderItem, SalesOrderStatus,
};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{decode_address, encode_address};

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_id, customer_name, customer_level, customer_tax_id,
    shipping_address, total_amount_cents, total_cost_cents, gross_profit_cents,
    status, payment_status, invoice_number, shipping_note, internal_note,
    created_by, approved_by, shipped_by, created_at, updated_at,
    approved_at, shipped_at, cancelled_at, version
"#;

const ITEM_COLUMNS: &str = r#"
    order_id, product_id, sku, name, spec, quantity, unit_price_cents,
    subtotal_cents, unit_cost_cents
"#;

#[derive(Debug, FromRow)]
struct SalesOrderRow {
    id: String,
    order_number: String,
    customer_id: String,
    customer_name: String,
    customer_level: PriceTier,
    customer_tax_id: Option<String>,
    shipping_address: Option<String>,
    total_amount_cents: i64,
    total_cost_cents: Option<i64>,
    gross_profit_cents: Option<i64>,
    status: SalesOrderStatus,
    payment_status: PaymentStatus,
    invoice_number: Option<String>,
    shipping_note: Option<String>,
    internal_note: Option<String>,
    created_by: String,
    approved_by: Option<String>,
    shipped_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    version: i64,
}

impl SalesOrderRow {
    fn into_order(self, items: Vec<SalesOrderItem>) -> DbResult<SalesOrder> {
        Ok(SalesOrder {
            shipping_address: decode_address(self.shipping_address.as_deref())?,
            id: self.id,
            order_number: self.order_number,
            customer_id: self.customer_id,
            customer_info: CustomerSnapshot {
                name: self.customer_name,
                level: self.customer_level,
                tax_id: self.customer_tax_id,
            },
            items,
            total_amount_cents: self.total_amount_cents,
            total_cost_cents: self.total_cost_cents,
            gross_profit_cents: self.gross_profit_cents,
            status: self.status,
            payment_status: self.payment_status,
            invoice_number: self.invoice_number,
            shipping_note: self.shipping_note,
            internal_note: self.internal_note,
            created_by: self.created_by,
            approved_by: self.approved_by,
            shipped_by: self.shipped_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            approved_at: self.approved_at,
            shipped_at: self.shipped_at,
            cancelled_at: self.cancelled_at,
            version: self.version,
        })
    }
}

#[derive(Debug, FromRow)]
struct SalesItemRow {
    order_id: String,
    #[sqlx(flatten)]
    item: SalesOrderItem,
}

/// Repository for sales orders.
#[derive(Debug, Clone)]
pub struct SalesOrderRepository {
    pool: SqlitePool,
}

impl SalesOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesOrderRepository { pool }
    }

    /// All sales orders with their items, newest first.
    pub async fn list(&self) -> DbResult<Vec<SalesOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders ORDER BY created_at DESC, order_number DESC"
        );
        let rows = sqlx::query_as::<_, SalesOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let orders = self.attach_items(rows).await?;
        debug!(count = orders.len(), "Listed sales orders");
        Ok(orders)
    }

    /// Completed orders, optionally for one customer. Date filtering happens
    /// in the caller on the decoded `shipped_at`.
    pub async fn list_completed(&self, customer_id: Option<&str>) -> DbResult<Vec<SalesOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM sales_orders \
             WHERE status = ?1 AND shipped_at IS NOT NULL \
               AND (?2 IS NULL OR customer_id = ?2) \
             ORDER BY shipped_at DESC"
        );
        let rows = sqlx::query_as::<_, SalesOrderRow>(&sql)
            .bind(SalesOrderStatus::Completed)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(rows).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SalesOrder>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sales_order(&mut conn, id).await
    }

    /// Inserts a complete order (header + items) in one transaction.
    pub async fn insert(&self, order: &SalesOrder) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_sales_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn attach_items(&self, rows: Vec<SalesOrderRow>) -> DbResult<Vec<SalesOrder>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {ITEM_COLUMNS} FROM sales_order_items ORDER BY order_id, line_no");
        let item_rows = sqlx::query_as::<_, SalesItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_order: HashMap<String, Vec<SalesOrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order.entry(row.order_id).or_default().push(row.item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch_sales_order(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<SalesOrder>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM sales_orders WHERE id = ?1");
    let row = sqlx::query_as::<_, SalesOrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let sql = format!("SELECT {ITEM_COLUMNS} FROM sales_order_items WHERE order_id = ?1 ORDER BY line_no");
    let items = sqlx::query_as::<_, SalesItemRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|r| r.item)
        .collect();

    row.into_order(items).map(Some)
}

pub(crate) async fn require_sales_order(conn: &mut SqliteConnection, id: &str) -> DbResult<SalesOrder> {
    fetch_sales_order(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("SalesOrder", id))
}

pub(crate) async fn insert_sales_order(conn: &mut SqliteConnection, order: &SalesOrder) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting sales order");

    let shipping_address = encode_address(order.shipping_address.as_ref())?;

    sqlx::query(
        r#"
        INSERT INTO sales_orders (
            id, order_number, customer_id, customer_name, customer_level, customer_tax_id,
            shipping_address, total_amount_cents, total_cost_cents, gross_profit_cents,
            status, payment_status, invoice_number, shipping_note, internal_note,
            created_by, approved_by, shipped_by, created_at, updated_at,
            approved_at, shipped_at, cancelled_at, version
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.customer_info.name)
    .bind(order.customer_info.level)
    .bind(&order.customer_info.tax_id)
    .bind(shipping_address)
    .bind(order.total_amount_cents)
    .bind(order.total_cost_cents)
    .bind(order.gross_profit_cents)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.invoice_number)
    .bind(&order.shipping_note)
    .bind(&order.internal_note)
    .bind(&order.created_by)
    .bind(&order.approved_by)
    .bind(&order.shipped_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.approved_at)
    .bind(order.shipped_at)
    .bind(order.cancelled_at)
    .bind(order.version)
    .execute(&mut *conn)
    .await?;

    for (line_no, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sales_order_items (
                order_id, line_no, product_id, sku, name, spec,
                quantity, unit_price_cents, subtotal_cents, unit_cost_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(line_no as i64)
        .bind(&item.product_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.spec)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.unit_cost_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Writes a status change on a sales order that has no cost effect
/// (approve, cancel).
pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    order: &SalesOrder,
    status: SalesOrderStatus,
    actor: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders SET
            status = ?3,
            approved_by = CASE WHEN ?3 = 'pending-shipment' THEN ?4 ELSE approved_by END,
            approved_at = CASE WHEN ?3 = 'pending-shipment' THEN ?5 ELSE approved_at END,
            cancelled_at = CASE WHEN ?3 = 'cancelled' THEN ?5 ELSE cancelled_at END,
            updated_at = ?5,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(status)
    .bind(actor)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("SalesOrder", &order.id));
    }

    Ok(())
}

/// Completes a shipped order: header totals plus each item's unit cost.
///
/// `order` carries the costed state; its `version` is the one read at the
/// start of the transaction.
pub(crate) async fn mark_shipped(conn: &mut SqliteConnection, order: &SalesOrder) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders SET
            status = ?3,
            total_cost_cents = ?4,
            gross_profit_cents = ?5,
            shipped_by = ?6,
            shipped_at = ?7,
            updated_at = ?7,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(order.status)
    .bind(order.total_cost_cents)
    .bind(order.gross_profit_cents)
    .bind(&order.shipped_by)
    .bind(order.shipped_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("SalesOrder", &order.id));
    }

    for (line_no, item) in order.items.iter().enumerate() {
        sqlx::query(
            "UPDATE sales_order_items SET unit_cost_cents = ?3 WHERE order_id = ?1 AND line_no = ?2",
        )
        .bind(&order.id)
        .bind(line_no as i64)
        .bind(item.unit_cost_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub(crate) async fn update_payment_status(
    conn: &mut SqliteConnection,
    order: &SalesOrder,
    payment_status: PaymentStatus,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders SET
            payment_status = ?3,
            updated_at = ?4,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(payment_status)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("SalesOrder", &order.id));
    }

    Ok(())
}
