//! Purchase order commands.

use stockwise_core::{PurchaseOrder, PurchaseOrderDraft, Session};

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

/// Purchase orders with their lines, newest first.
pub async fn list_purchase_orders(app: &Backoffice) -> Vec<PurchaseOrder> {
    or_empty("list_purchase_orders", app.db().purchase_orders().list().await)
}

pub async fn get_purchase_order(app: &Backoffice, id: &str) -> Result<PurchaseOrder, ApiError> {
    app.db()
        .purchase_orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("PurchaseOrder", id))
}

/// Creates a `pending-receipt` order. Returns the order id.
pub async fn create_purchase_order(
    app: &Backoffice,
    session: &Session,
    draft: &PurchaseOrderDraft,
) -> Result<String, ApiError> {
    let order = app.db().purchase_fulfillment().create_order(session, draft).await?;
    Ok(order.id)
}

/// Books every line into stock at its unit cost and completes the order.
pub async fn receive_purchase_order(app: &Backoffice, session: &Session, id: &str) -> Result<PurchaseOrder, ApiError> {
    Ok(app.db().purchase_fulfillment().receive(session, id).await?)
}

pub async fn cancel_purchase_order(app: &Backoffice, session: &Session, id: &str) -> Result<PurchaseOrder, ApiError> {
    Ok(app.db().purchase_fulfillment().cancel(session, id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product::{get_product, save_product};
    use crate::commands::supplier::save_supplier;
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};
    use stockwise_core::{ProductDraft, PurchaseLineDraft, PurchaseOrderStatus, SupplierDraft};

    #[tokio::test]
    async fn test_create_receive_and_list() {
        let app = backoffice().await;
        let supplier_id = save_supplier(
            &app,
            &clerk(),
            &SupplierDraft {
                supplier_code: "S-001".into(),
                name: "Harbor Furniture Works".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let product_id = save_product(
            &app,
            &clerk(),
            &ProductDraft {
                sku: "DESK-01".into(),
                name: "Standing Desk".into(),
                unit: "pcs".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let draft = PurchaseOrderDraft {
            supplier_id,
            items: vec![PurchaseLineDraft {
                product_id: product_id.clone(),
                quantity: 4,
                unit_cost_cents: 30_000,
            }],
            note: None,
        };
        let id = create_purchase_order(&app, &clerk(), &draft).await.unwrap();

        let order = receive_purchase_order(&app, &clerk(), &id).await.unwrap();
        assert_eq!(order.status, PurchaseOrderStatus::Completed);

        let product = get_product(&app, &product_id).await.unwrap();
        assert_eq!(product.current_stock, 4);
        assert_eq!(product.average_cost_cents, 30_000);

        let err = cancel_purchase_order(&app, &clerk(), &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        assert_eq!(list_purchase_orders(&app).await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_order_is_rejected() {
        let app = backoffice().await;
        let draft = PurchaseOrderDraft {
            supplier_id: "s-1".into(),
            items: Vec::new(),
            note: None,
        };

        let err = create_purchase_order(&app, &clerk(), &draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
