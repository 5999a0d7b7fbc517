//! # Sales Order Commands
//!
//! ```text
//! create_sales_order ──► pending-approval ──approve──► pending-shipment
//!                              │                            │
//!                              │                          ship (stock out,
//!                              │                            │   costing)
//!                              └──cancel──► cancelled ◄─────┤
//!                                                           ▼
//!                                                       completed
//! ```

use stockwise_core::{PaymentStatus, SalesOrder, SalesOrderDraft, Session};

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

/// Sales orders with their lines, newest first.
pub async fn list_sales_orders(app: &Backoffice) -> Vec<SalesOrder> {
    or_empty("list_sales_orders", app.db().sales_orders().list().await)
}

pub async fn get_sales_order(app: &Backoffice, id: &str) -> Result<SalesOrder, ApiError> {
    app.db()
        .sales_orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("SalesOrder", id))
}

/// Creates a `pending-approval` order. Returns the order id.
pub async fn create_sales_order(app: &Backoffice, session: &Session, draft: &SalesOrderDraft) -> Result<String, ApiError> {
    let order = app.db().sales_fulfillment().create_order(session, draft).await?;
    Ok(order.id)
}

pub async fn approve_sales_order(app: &Backoffice, session: &Session, id: &str) -> Result<SalesOrder, ApiError> {
    Ok(app.db().sales_fulfillment().approve(session, id).await?)
}

pub async fn cancel_sales_order(app: &Backoffice, session: &Session, id: &str) -> Result<SalesOrder, ApiError> {
    Ok(app.db().sales_fulfillment().cancel(session, id).await?)
}

/// Ships the whole order or nothing; `INSUFFICIENT_STOCK` names the short SKU.
pub async fn ship_sales_order(app: &Backoffice, session: &Session, id: &str) -> Result<SalesOrder, ApiError> {
    Ok(app.db().sales_fulfillment().ship(session, id).await?)
}

pub async fn update_payment_status(
    app: &Backoffice,
    session: &Session,
    id: &str,
    payment_status: PaymentStatus,
) -> Result<SalesOrder, ApiError> {
    Ok(app
        .db()
        .sales_fulfillment()
        .update_payment_status(session, id, payment_status)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::customer::save_customer;
    use crate::commands::product::{get_product, save_product};
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};
    use stockwise_core::{CustomerDraft, ProductDraft, SalesLineDraft, SalesOrderStatus};

    async fn setup(app: &Backoffice) -> (String, String) {
        let customer_id = save_customer(
            app,
            &clerk(),
            &CustomerDraft {
                customer_code: "C-001".into(),
                name: "Summit Coworking".into(),
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let product_id = save_product(
            app,
            &clerk(),
            &ProductDraft {
                sku: "CHAIR-01".into(),
                name: "Office Chair".into(),
                unit: "pcs".into(),
                price_retail_cents: 20_000,
                is_active: true,
                opening_stock: 15,
                opening_cost_cents: 14_333,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (customer_id, product_id)
    }

    fn order(customer_id: &str, product_id: &str, quantity: i64) -> SalesOrderDraft {
        SalesOrderDraft {
            customer_id: customer_id.into(),
            items: vec![SalesLineDraft {
                product_id: product_id.into(),
                quantity,
                unit_price_cents: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let app = backoffice().await;
        let (customer_id, product_id) = setup(&app).await;

        let id = create_sales_order(&app, &clerk(), &order(&customer_id, &product_id, 5))
            .await
            .unwrap();
        approve_sales_order(&app, &clerk(), &id).await.unwrap();

        let shipped = ship_sales_order(&app, &clerk(), &id).await.unwrap();
        assert_eq!(shipped.status, SalesOrderStatus::Completed);
        assert_eq!(shipped.total_cost_cents, Some(71_665));
        assert_eq!(shipped.gross_profit_cents, Some(28_335));

        let paid = update_payment_status(&app, &clerk(), &id, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        assert_eq!(get_product(&app, &product_id).await.unwrap().current_stock, 10);
        assert_eq!(list_sales_orders(&app).await.len(), 1);
    }

    #[tokio::test]
    async fn test_short_shipment_surfaces_code() {
        let app = backoffice().await;
        let (customer_id, product_id) = setup(&app).await;

        let id = create_sales_order(&app, &clerk(), &order(&customer_id, &product_id, 20))
            .await
            .unwrap();
        approve_sales_order(&app, &clerk(), &id).await.unwrap();

        let err = ship_sales_order(&app, &clerk(), &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("CHAIR-01"));

        let order = get_sales_order(&app, &id).await.unwrap();
        assert_eq!(order.status, SalesOrderStatus::PendingShipment);
    }

    #[tokio::test]
    async fn test_anonymous_ship_is_unauthorized() {
        let app = backoffice().await;
        let err = ship_sales_order(&app, &Session::anonymous(), "so-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
