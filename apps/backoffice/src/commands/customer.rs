//! Customer commands.

use stockwise_core::validation::validate_customer_draft;
use stockwise_core::{Customer, CustomerDraft, DeleteOutcome, Session};
use tracing::info;

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

pub async fn list_customers(app: &Backoffice, include_inactive: bool) -> Vec<Customer> {
    or_empty("list_customers", app.db().customers().list(include_inactive).await)
}

pub async fn get_customer(app: &Backoffice, id: &str) -> Result<Customer, ApiError> {
    app.db()
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

/// Creates or updates a customer. Returns the id.
///
/// Existing orders keep the customer snapshot taken when they were created.
pub async fn save_customer(app: &Backoffice, session: &Session, draft: &CustomerDraft) -> Result<String, ApiError> {
    let actor = session.require_actor()?;
    validate_customer_draft(draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let customer = app.db().customers().upsert(draft).await?;

    info!(code = %customer.customer_code, level = %customer.level, user = %actor, "Customer saved");
    Ok(customer.id)
}

/// Deletes an unreferenced customer; one with orders is deactivated.
pub async fn delete_customer(app: &Backoffice, session: &Session, id: &str) -> Result<DeleteOutcome, ApiError> {
    let actor = session.require_actor()?;

    let outcome = app.db().customers().delete_or_deactivate(id).await?;

    info!(customer_id = %id, outcome = ?outcome, user = %actor, "Customer delete requested");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};
    use stockwise_core::PriceTier;

    #[tokio::test]
    async fn test_save_update_delete() {
        let app = backoffice().await;
        let mut draft = CustomerDraft {
            customer_code: "C-001".into(),
            name: "Maple Street Dental".into(),
            level: PriceTier::Silver,
            is_active: true,
            ..Default::default()
        };

        let id = save_customer(&app, &clerk(), &draft).await.unwrap();

        draft.id = Some(id.clone());
        draft.level = PriceTier::Gold;
        save_customer(&app, &clerk(), &draft).await.unwrap();

        let customer = get_customer(&app, &id).await.unwrap();
        assert_eq!(customer.level, PriceTier::Gold);
        assert_eq!(list_customers(&app, false).await.len(), 1);

        let outcome = delete_customer(&app, &clerk(), &id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(list_customers(&app, true).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_code() {
        let app = backoffice().await;
        let draft = CustomerDraft {
            customer_code: "C-001".into(),
            name: "First".into(),
            is_active: true,
            ..Default::default()
        };
        save_customer(&app, &clerk(), &draft).await.unwrap();

        let err = save_customer(&app, &clerk(), &CustomerDraft { name: "Second".into(), ..draft })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
