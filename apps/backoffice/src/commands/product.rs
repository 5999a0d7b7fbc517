//! # Product Commands
//!
//! Product master data. Stock and average cost are read-only here; they move
//! only through the inventory, purchase and sales commands.
//!
//! ## Delete Flow
//! ```text
//! delete_product(id)
//!      │
//!      ▼
//! referenced by history or any order line?
//!      │ no                         │ yes
//!      ▼                            ▼
//! row removed → "deleted"      is_active = false → "deactivated"
//!                              (ledger stays explainable)
//! ```

use serde::{Deserialize, Serialize};
use stockwise_core::validation::validate_product_draft;
use stockwise_core::{DeleteOutcome, Product, ProductDraft, Session};
use tracing::{debug, info};

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

/// Product as the presentation layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub spec: Option<String>,
    pub unit: String,
    pub barcode: Option<String>,
    pub price_retail_cents: i64,
    pub price_bronze_cents: i64,
    pub price_silver_cents: i64,
    pub price_gold_cents: i64,
    pub current_stock: i64,
    pub average_cost_cents: i64,
    pub low_stock_threshold: Option<i64>,
    /// Precomputed so the list view can badge rows without repeating the rule.
    pub is_low_stock: bool,
    pub supplier_id: Option<String>,
    pub is_active: bool,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        let is_low_stock = p.is_low_stock();
        ProductDto {
            id: p.id,
            sku: p.sku,
            name: p.name,
            brand: p.brand,
            category: p.category,
            spec: p.spec,
            unit: p.unit,
            barcode: p.barcode,
            price_retail_cents: p.price_retail_cents,
            price_bronze_cents: p.price_bronze_cents,
            price_silver_cents: p.price_silver_cents,
            price_gold_cents: p.price_gold_cents,
            current_stock: p.current_stock,
            average_cost_cents: p.average_cost_cents,
            low_stock_threshold: p.low_stock_threshold,
            is_low_stock,
            supplier_id: p.supplier_id,
            is_active: p.is_active,
        }
    }
}

/// Products, newest first. Inactive products only when asked for.
pub async fn list_products(app: &Backoffice, include_inactive: bool) -> Vec<ProductDto> {
    debug!(include_inactive, "list_products command");

    let products = or_empty("list_products", app.db().products().list(include_inactive).await);
    products.into_iter().map(ProductDto::from).collect()
}

/// Active products at or below their low-stock threshold.
pub async fn list_low_stock(app: &Backoffice) -> Vec<ProductDto> {
    let products = or_empty("list_low_stock", app.db().products().list_low_stock().await);
    products.into_iter().map(ProductDto::from).collect()
}

pub async fn get_product(app: &Backoffice, id: &str) -> Result<ProductDto, ApiError> {
    app.db()
        .products()
        .get_by_id(id)
        .await?
        .map(ProductDto::from)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn get_product_by_sku(app: &Backoffice, sku: &str) -> Result<ProductDto, ApiError> {
    app.db()
        .products()
        .get_by_sku(sku)
        .await?
        .map(ProductDto::from)
        .ok_or_else(|| ApiError::not_found("Product", sku))
}

/// Creates a product (draft without id) or updates one. Returns the id.
///
/// On create, a positive `opening_stock` is booked as an adjustment entry.
/// On update, SKU, stock and average cost are left as they are.
pub async fn save_product(app: &Backoffice, session: &Session, draft: &ProductDraft) -> Result<String, ApiError> {
    let actor = session.require_actor()?;
    validate_product_draft(draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let product = app.db().products().upsert(draft, actor).await?;

    info!(sku = %product.sku, user = %actor, "Product saved");
    Ok(product.id)
}

pub async fn delete_product(app: &Backoffice, session: &Session, id: &str) -> Result<DeleteOutcome, ApiError> {
    let actor = session.require_actor()?;

    let outcome = app.db().products().delete_or_deactivate(id).await?;

    info!(product_id = %id, outcome = ?outcome, user = %actor, "Product delete requested");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};

    fn draft(sku: &str) -> ProductDraft {
        ProductDraft {
            sku: sku.into(),
            name: "Office Chair".into(),
            unit: "pcs".into(),
            price_retail_cents: 25_000,
            low_stock_threshold: Some(5),
            is_active: true,
            opening_stock: 3,
            opening_cost_cents: 12_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let app = backoffice().await;
        let id = save_product(&app, &clerk(), &draft("CHAIR-01")).await.unwrap();

        let products = list_products(&app, false).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].current_stock, 3);
        assert!(products[0].is_low_stock);

        assert_eq!(list_low_stock(&app).await.len(), 1);
        assert_eq!(get_product_by_sku(&app, "CHAIR-01").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_store() {
        let app = backoffice().await;
        let err = save_product(&app, &clerk(), &draft("bad sku!")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(list_products(&app, true).await.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_save_is_unauthorized() {
        let app = backoffice().await;
        let err = save_product(&app, &Session::anonymous(), &draft("CHAIR-01"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_delete_with_history_deactivates() {
        let app = backoffice().await;
        let id = save_product(&app, &clerk(), &draft("CHAIR-01")).await.unwrap();

        let outcome = delete_product(&app, &clerk(), &id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deactivated);
        assert!(list_products(&app, false).await.is_empty());
        assert_eq!(list_products(&app, true).await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_product() {
        let app = backoffice().await;
        let err = get_product(&app, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
