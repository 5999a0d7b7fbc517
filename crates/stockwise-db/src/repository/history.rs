//! # Inventory History Repository
//!
//! The append-only ledger. Rows are inserted once and never touched again;
//! triggers in the schema abort any UPDATE or DELETE.
//!
//! `seq` (an AUTOINCREMENT rowid) gives the total order. Timestamps are for
//! people; ordering always uses `seq`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockwise_core::ledger::StockMovement;
use stockwise_core::{ActorId, InventoryHistoryEntry};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{generate_id, product};

const HISTORY_COLUMNS: &str = r#"
    seq, id, product_id, sku, product_name, movement_type, change, stock_after,
    cost_before_cents, cost_after_cents, related_doc_id, note, user_id, created_at
"#;

/// Repository for reading the inventory ledger.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// All entries, newest first. `limit` of `None` returns everything.
    pub async fn list(&self, limit: Option<u32>) -> DbResult<Vec<InventoryHistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM inventory_history ORDER BY seq DESC LIMIT ?1"
        );

        // SQLite treats a negative LIMIT as no limit
        let limit = limit.map(i64::from).unwrap_or(-1);

        let entries = sqlx::query_as::<_, InventoryHistoryEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = entries.len(), "Listed inventory history");
        Ok(entries)
    }

    /// Entries for one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryHistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM inventory_history \
             WHERE product_id = ?1 ORDER BY seq DESC"
        );

        let entries = sqlx::query_as::<_, InventoryHistoryEntry>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Entries caused by one order, in the order they were written.
    pub async fn list_for_document(&self, related_doc_id: &str) -> DbResult<Vec<InventoryHistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM inventory_history \
             WHERE related_doc_id = ?1 ORDER BY seq ASC"
        );

        let entries = sqlx::query_as::<_, InventoryHistoryEntry>(&sql)
            .bind(related_doc_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

/// Persists one planned movement: the product row and its ledger line.
///
/// Must run inside the caller's transaction. The product write is
/// version-checked, so a movement planned from a stale read fails with
/// `VersionConflict` and nothing is appended.
pub(crate) async fn record_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
    related_doc_id: Option<&str>,
    note: Option<&str>,
    actor: &ActorId,
    at: DateTime<Utc>,
) -> DbResult<InventoryHistoryEntry> {
    product::update_stock_level(conn, movement, at).await?;

    let mut entry = InventoryHistoryEntry {
        seq: 0,
        id: generate_id(),
        product_id: movement.product_id.clone(),
        sku: movement.sku.clone(),
        product_name: movement.product_name.clone(),
        movement_type: movement.movement_type,
        change: movement.change,
        stock_after: movement.stock_after,
        cost_before_cents: Some(movement.cost_before.cents()),
        cost_after_cents: Some(movement.cost_after.cents()),
        related_doc_id: related_doc_id.map(str::to_string),
        note: note.map(str::to_string),
        user_id: actor.as_str().to_string(),
        created_at: at,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO inventory_history (
            id, product_id, sku, product_name, movement_type, change, stock_after,
            cost_before_cents, cost_after_cents, related_doc_id, note, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.product_id)
    .bind(&entry.sku)
    .bind(&entry.product_name)
    .bind(entry.movement_type)
    .bind(entry.change)
    .bind(entry.stock_after)
    .bind(entry.cost_before_cents)
    .bind(entry.cost_after_cents)
    .bind(&entry.related_doc_id)
    .bind(&entry.note)
    .bind(&entry.user_id)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    entry.seq = result.last_insert_rowid();

    debug!(
        sku = %entry.sku,
        movement_type = %entry.movement_type,
        change = entry.change,
        stock_after = entry.stock_after,
        "Ledger entry appended"
    );

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockwise_core::ProductDraft;

    #[tokio::test]
    async fn test_history_is_append_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let draft = ProductDraft {
            sku: "CHAIR-01".into(),
            name: "Office Chair".into(),
            unit: "pcs".into(),
            is_active: true,
            opening_stock: 5,
            ..Default::default()
        };
        db.products().upsert(&draft, &ActorId::new("u-1")).await.unwrap();

        let update = sqlx::query("UPDATE inventory_history SET change = 99")
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM inventory_history").execute(db.pool()).await;
        assert!(delete.is_err());

        assert_eq!(db.history().list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_limited() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let actor = ActorId::new("u-1");

        for sku in ["A-1", "B-2", "C-3"] {
            let draft = ProductDraft {
                sku: sku.into(),
                name: sku.into(),
                unit: "pcs".into(),
                is_active: true,
                opening_stock: 1,
                ..Default::default()
            };
            db.products().upsert(&draft, &actor).await.unwrap();
        }

        let all = db.history().list(None).await.unwrap();
        let skus: Vec<_> = all.iter().map(|e| e.sku.as_str()).collect();
        assert_eq!(skus, vec!["C-3", "B-2", "A-1"]);
        assert!(all[0].seq > all[1].seq);

        assert_eq!(db.history().list(Some(2)).await.unwrap().len(), 2);
    }
}
