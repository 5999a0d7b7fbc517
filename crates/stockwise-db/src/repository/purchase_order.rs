//! # Purchase Order Repository
//!
//! Purchase order headers and their items.
//!
//! ## Storage
//! ```text
//! purchase_orders (1) ──< purchase_order_items (N), keyed (order_id, line_no)
//!
//! supplier_name / supplier_tax_id are the snapshot taken at creation.
//! Status changes are version-checked like product stock writes.
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use stockwise_core::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, SupplierSnapshot};
use tracing::debug;

use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = r#"
    id, order_number, supplier_id, supplier_name, supplier_tax_id, total_amount_cents,
    status, note, created_by, received_by, created_at, updated_at, received_at,
    cancelled_at, version
"#;

const ITEM_COLUMNS: &str = r#"
    order_id, product_id, sku, name, spec, quantity, unit_cost_cents, subtotal_cents
"#;

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: String,
    order_number: String,
    supplier_id: String,
    supplier_name: String,
    supplier_tax_id: Option<String>,
    total_amount_cents: i64,
    status: PurchaseOrderStatus,
    note: Option<String>,
    created_by: String,
    received_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    version: i64,
}

impl PurchaseOrderRow {
    fn into_order(self, items: Vec<PurchaseOrderItem>) -> PurchaseOrder {
        PurchaseOrder {
            id: self.id,
            order_number: self.order_number,
            supplier_id: self.supplier_id,
            supplier_info: SupplierSnapshot {
                name: self.supplier_name,
                tax_id: self.supplier_tax_id,
            },
            items,
            total_amount_cents: self.total_amount_cents,
            status: self.status,
            note: self.note,
            created_by: self.created_by,
            received_by: self.received_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            received_at: self.received_at,
            cancelled_at: self.cancelled_at,
            version: self.version,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseItemRow {
    order_id: String,
    #[sqlx(flatten)]
    item: PurchaseOrderItem,
}

/// Repository for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// All purchase orders with their items, newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM purchase_orders ORDER BY created_at DESC, order_number DESC"
        );
        let rows = sqlx::query_as::<_, PurchaseOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM purchase_order_items ORDER BY order_id, line_no");
        let item_rows = sqlx::query_as::<_, PurchaseItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_order: HashMap<String, Vec<PurchaseOrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order.entry(row.order_id).or_default().push(row.item);
        }

        let orders: Vec<PurchaseOrder> = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect();

        debug!(count = orders.len(), "Listed purchase orders");
        Ok(orders)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let mut conn = self.pool.acquire().await?;
        fetch_purchase_order(&mut conn, id).await
    }

    /// Inserts a complete order (header + items) in one transaction.
    pub async fn insert(&self, order: &PurchaseOrder) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_purchase_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch_purchase_order(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<PurchaseOrder>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM purchase_orders WHERE id = ?1");
    let row = sqlx::query_as::<_, PurchaseOrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM purchase_order_items WHERE order_id = ?1 ORDER BY line_no"
    );
    let items = sqlx::query_as::<_, PurchaseItemRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|r| r.item)
        .collect();

    Ok(Some(row.into_order(items)))
}

pub(crate) async fn require_purchase_order(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<PurchaseOrder> {
    fetch_purchase_order(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("PurchaseOrder", id))
}

pub(crate) async fn insert_purchase_order(
    conn: &mut SqliteConnection,
    order: &PurchaseOrder,
) -> DbResult<()> {
    debug!(id = %order.id, order_number = %order.order_number, "Inserting purchase order");

    sqlx::query(
        r#"
        INSERT INTO purchase_orders (
            id, order_number, supplier_id, supplier_name, supplier_tax_id,
            total_amount_cents, status, note, created_by, received_by,
            created_at, updated_at, received_at, cancelled_at, version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.supplier_id)
    .bind(&order.supplier_info.name)
    .bind(&order.supplier_info.tax_id)
    .bind(order.total_amount_cents)
    .bind(order.status)
    .bind(&order.note)
    .bind(&order.created_by)
    .bind(&order.received_by)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.received_at)
    .bind(order.cancelled_at)
    .bind(order.version)
    .execute(&mut *conn)
    .await?;

    for (line_no, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO purchase_order_items (
                order_id, line_no, product_id, sku, name, spec,
                quantity, unit_cost_cents, subtotal_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(line_no as i64)
        .bind(&item.product_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.spec)
        .bind(item.quantity)
        .bind(item.unit_cost_cents)
        .bind(item.subtotal_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Moves a pending order to `completed`.
pub(crate) async fn mark_received(
    conn: &mut SqliteConnection,
    order: &PurchaseOrder,
    received_by: &str,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders SET
            status = ?3,
            received_by = ?4,
            received_at = ?5,
            updated_at = ?5,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(PurchaseOrderStatus::Completed)
    .bind(received_by)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("PurchaseOrder", &order.id));
    }

    Ok(())
}

/// Moves a pending order to `cancelled`.
pub(crate) async fn mark_cancelled(
    conn: &mut SqliteConnection,
    order: &PurchaseOrder,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders SET
            status = ?3,
            cancelled_at = ?4,
            updated_at = ?4,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(PurchaseOrderStatus::Cancelled)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("PurchaseOrder", &order.id));
    }

    Ok(())
}
