//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with `upsert` keyed by storage id
//! - Low-stock listing
//! - Delete-or-deactivate for referenced products
//! - Version-checked stock writes (crate-private, used by the ledger)
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Optimistic Stock Update                              │
//! │                                                                         │
//! │  Ledger reads product (version 7, stock 15)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET current_stock = 10, version = version + 1         │
//! │  WHERE id = ? AND version = 7                                          │
//! │       │                                                                 │
//! │       ├── 1 row  → written, version is now 8                            │
//! │       └── 0 rows → someone else committed first → VersionConflict      │
//! │                    (the ledger retries the whole transaction)          │
//! │                                                                         │
//! │  Absolute values are written, never `current_stock + delta`, so the    │
//! │  value stored is always the one that was checked against zero.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use stockwise_core::ledger::StockMovement;
use stockwise_core::{ActorId, DeleteOutcome, HistoryType, Money, Product, ProductDraft};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use crate::repository::history;

const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, brand, category, spec, unit, description, barcode,
    price_retail_cents, price_bronze_cents, price_silver_cents, price_gold_cents,
    current_stock, average_cost_cents, low_stock_threshold, supplier_id,
    is_active, created_at, updated_at, version
"#;

/// Note written on the history entry that books a product's opening stock.
pub const OPENING_BALANCE_NOTE: &str = "Opening balance";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.upsert(&draft, &actor).await?;
/// let same = repo.get_by_sku("CHAIR-01").await?;
/// let low = repo.list_low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, newest first.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE (?1 OR is_active = 1) \
             ORDER BY created_at DESC, sku"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Creates or updates a product from a draft.
    ///
    /// ## Create
    /// A draft without an id (or with an id that does not exist yet) inserts
    /// a new product. A positive `opening_stock` is booked in the same
    /// transaction as an `adjustment` entry so the ledger explains the
    /// starting quantity; `opening_cost_cents` seeds the average cost.
    ///
    /// ## Update
    /// Only descriptive fields and prices change. SKU, stock and average cost
    /// are left alone: the SKU is immutable and the other two belong to the
    /// ledger.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already used by another product
    pub async fn upsert(&self, draft: &ProductDraft, actor: &ActorId) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let existing = match draft.id.as_deref() {
            Some(id) => fetch_product(&mut tx, id).await?,
            None => None,
        };

        let id = match existing {
            Some(current) => {
                update_details(&mut tx, &current.id, draft).await?;
                current.id
            }
            None => insert_new(&mut tx, draft, actor).await?,
        };

        let product = require_product(&mut tx, &id).await?;
        tx.commit().await?;

        info!(id = %product.id, sku = %product.sku, "Product saved");
        Ok(product)
    }

    /// Soft-deletes a product by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        deactivate(&mut conn, id).await
    }

    /// Deletes a product, or deactivates it while anything references it.
    ///
    /// ## Why Not Always Delete?
    /// History entries and order lines point at the product. Removing it
    /// would leave the ledger unable to explain past stock levels.
    pub async fn delete_or_deactivate(&self, id: &str) -> DbResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        if fetch_product(&mut tx, id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        let referenced: i64 = sqlx::query_scalar(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM inventory_history WHERE product_id = ?1)
                OR EXISTS(SELECT 1 FROM sales_order_items WHERE product_id = ?1)
                OR EXISTS(SELECT 1 FROM purchase_order_items WHERE product_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if referenced != 0 {
            deactivate(&mut tx, id).await?;
            DeleteOutcome::Deactivated
        } else {
            sqlx::query("DELETE FROM products WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deleted
        };

        tx.commit().await?;

        info!(id = %id, outcome = ?outcome, "Product removed");
        Ok(outcome)
    }

    /// Active products whose stock is at or below their threshold, emptiest first.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 \
               AND low_stock_threshold IS NOT NULL \
               AND current_stock <= low_stock_threshold \
             ORDER BY current_stock ASC, sku"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Like [`fetch_product`] but a missing row is `DbError::NotFound`.
pub(crate) async fn require_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    fetch_product(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Writes the outcome of a planned movement onto the product row.
///
/// Fails with `VersionConflict` when the row no longer has the version the
/// movement was planned against.
pub(crate) async fn update_stock_level(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            current_stock = ?2,
            average_cost_cents = ?3,
            updated_at = ?4,
            version = version + 1
        WHERE id = ?1 AND version = ?5
        "#,
    )
    .bind(&movement.product_id)
    .bind(movement.stock_after)
    .bind(movement.cost_after.cents())
    .bind(at)
    .bind(movement.expected_version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::version_conflict("Product", &movement.product_id));
    }

    Ok(())
}

async fn deactivate(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    debug!(id = %id, "Deactivating product");

    let result = sqlx::query(
        r#"
        UPDATE products SET
            is_active = 0,
            updated_at = ?2,
            version = version + 1
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

async fn update_details(conn: &mut SqliteConnection, id: &str, draft: &ProductDraft) -> DbResult<()> {
    debug!(id = %id, "Updating product");

    sqlx::query(
        r#"
        UPDATE products SET
            name = ?2,
            brand = ?3,
            category = ?4,
            spec = ?5,
            unit = ?6,
            description = ?7,
            barcode = ?8,
            price_retail_cents = ?9,
            price_bronze_cents = ?10,
            price_silver_cents = ?11,
            price_gold_cents = ?12,
            low_stock_threshold = ?13,
            supplier_id = ?14,
            is_active = ?15,
            updated_at = ?16,
            version = version + 1
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(draft.name.trim())
    .bind(&draft.brand)
    .bind(&draft.category)
    .bind(&draft.spec)
    .bind(draft.unit.trim())
    .bind(&draft.description)
    .bind(&draft.barcode)
    .bind(draft.price_retail_cents)
    .bind(draft.price_bronze_cents)
    .bind(draft.price_silver_cents)
    .bind(draft.price_gold_cents)
    .bind(draft.low_stock_threshold)
    .bind(&draft.supplier_id)
    .bind(draft.is_active)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_new(conn: &mut SqliteConnection, draft: &ProductDraft, actor: &ActorId) -> DbResult<String> {
    let id = draft.id.clone().unwrap_or_else(generate_id);
    let now = Utc::now();

    debug!(id = %id, sku = %draft.sku, "Inserting product");

    // Starts at zero stock; the opening balance goes through the ledger below.
    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, brand, category, spec, unit, description, barcode,
            price_retail_cents, price_bronze_cents, price_silver_cents, price_gold_cents,
            current_stock, average_cost_cents, low_stock_threshold, supplier_id,
            is_active, created_at, updated_at, version
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            0, ?14, ?15, ?16,
            ?17, ?18, ?18, 0
        )
        "#,
    )
    .bind(&id)
    .bind(draft.sku.trim())
    .bind(draft.name.trim())
    .bind(&draft.brand)
    .bind(&draft.category)
    .bind(&draft.spec)
    .bind(draft.unit.trim())
    .bind(&draft.description)
    .bind(&draft.barcode)
    .bind(draft.price_retail_cents)
    .bind(draft.price_bronze_cents)
    .bind(draft.price_silver_cents)
    .bind(draft.price_gold_cents)
    .bind(draft.opening_cost_cents)
    .bind(draft.low_stock_threshold)
    .bind(&draft.supplier_id)
    .bind(draft.is_active)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } if field == "products.sku" => {
            DbError::duplicate(field, draft.sku.trim())
        }
        other => other,
    })?;

    if draft.opening_stock > 0 {
        let opening_cost = Money::from_cents(draft.opening_cost_cents);
        let movement = StockMovement {
            product_id: id.clone(),
            sku: draft.sku.trim().to_string(),
            product_name: draft.name.trim().to_string(),
            movement_type: HistoryType::Adjustment,
            change: draft.opening_stock,
            stock_before: 0,
            stock_after: draft.opening_stock,
            cost_before: opening_cost,
            cost_after: opening_cost,
            expected_version: 0,
        };

        history::record_movement(conn, &movement, None, Some(OPENING_BALANCE_NOTE), actor, now).await?;
    }

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn draft(sku: &str) -> ProductDraft {
        ProductDraft {
            sku: sku.to_string(),
            name: "Office Chair".to_string(),
            unit: "pcs".to_string(),
            price_retail_cents: 20_000,
            is_active: true,
            ..Default::default()
        }
    }

    fn actor() -> ActorId {
        ActorId::new("u-admin")
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.upsert(&draft("CHAIR-01"), &actor()).await.unwrap();
        assert_eq!(created.current_stock, 0);
        assert_eq!(created.version, 0);

        let by_id = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "CHAIR-01");

        let by_sku = repo.get_by_sku("CHAIR-01").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_opening_stock_is_booked_in_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut d = draft("CHAIR-01");
        d.opening_stock = 10;
        d.opening_cost_cents = 10_000;
        let product = db.products().upsert(&d, &actor()).await.unwrap();

        assert_eq!(product.current_stock, 10);
        assert_eq!(product.average_cost_cents, 10_000);
        assert_eq!(product.version, 1);

        let entries = db.history().list_for_product(&product.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].movement_type, HistoryType::Adjustment);
        assert_eq!(entries[0].change, 10);
        assert_eq!(entries[0].stock_after, 10);
        assert_eq!(entries[0].note.as_deref(), Some(OPENING_BALANCE_NOTE));
    }

    #[tokio::test]
    async fn test_update_keeps_sku_and_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut d = draft("CHAIR-01");
        d.opening_stock = 4;
        let created = repo.upsert(&d, &actor()).await.unwrap();

        let mut edit = draft("CHAIR-99");
        edit.id = Some(created.id.clone());
        edit.name = "Ergonomic Chair".to_string();
        edit.opening_stock = 100;
        let updated = repo.upsert(&edit, &actor()).await.unwrap();

        assert_eq!(updated.name, "Ergonomic Chair");
        assert_eq!(updated.sku, "CHAIR-01");
        assert_eq!(updated.current_stock, 4);
        assert!(updated.version > created.version);
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.upsert(&draft("CHAIR-01"), &actor()).await.unwrap();
        let err = repo.upsert(&draft("CHAIR-01"), &actor()).await.unwrap_err();

        assert!(err.is_unique_violation_on("products.sku"));
    }

    #[tokio::test]
    async fn test_delete_or_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let unused = repo.upsert(&draft("DESK-01"), &actor()).await.unwrap();
        assert_eq!(
            repo.delete_or_deactivate(&unused.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(repo.get_by_id(&unused.id).await.unwrap().is_none());

        let mut d = draft("CHAIR-01");
        d.opening_stock = 3;
        let stocked = repo.upsert(&d, &actor()).await.unwrap();
        assert_eq!(
            repo.delete_or_deactivate(&stocked.id).await.unwrap(),
            DeleteOutcome::Deactivated
        );
        let kept = repo.get_by_id(&stocked.id).await.unwrap().unwrap();
        assert!(!kept.is_active);

        assert!(repo.list(false).await.unwrap().is_empty());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);

        assert!(matches!(
            repo.delete_or_deactivate("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut low = draft("CHAIR-01");
        low.opening_stock = 2;
        low.low_stock_threshold = Some(5);
        repo.upsert(&low, &actor()).await.unwrap();

        let mut fine = draft("DESK-01");
        fine.opening_stock = 20;
        fine.low_stock_threshold = Some(5);
        repo.upsert(&fine, &actor()).await.unwrap();

        // No threshold: never listed
        repo.upsert(&draft("LAMP-01"), &actor()).await.unwrap();

        let listed = repo.list_low_stock().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sku, "CHAIR-01");
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().upsert(&draft("CHAIR-01"), &actor()).await.unwrap();

        let movement = stockwise_core::ledger::plan_adjustment(&product, 5).unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        update_stock_level(&mut conn, &movement, Utc::now()).await.unwrap();

        // Same plan again: the row moved on to version 1
        let err = update_stock_level(&mut conn, &movement, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { .. }));
    }
}
