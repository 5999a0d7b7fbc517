//! Supplier commands.

use stockwise_core::validation::validate_supplier_draft;
use stockwise_core::{DeleteOutcome, Session, Supplier, SupplierDraft};
use tracing::info;

use super::or_empty;
use crate::error::ApiError;
use crate::Backoffice;

pub async fn list_suppliers(app: &Backoffice, include_inactive: bool) -> Vec<Supplier> {
    or_empty("list_suppliers", app.db().suppliers().list(include_inactive).await)
}

pub async fn save_supplier(app: &Backoffice, session: &Session, draft: &SupplierDraft) -> Result<String, ApiError> {
    let actor = session.require_actor()?;
    validate_supplier_draft(draft).map_err(|e| ApiError::validation(e.to_string()))?;

    let supplier = app.db().suppliers().upsert(draft).await?;

    info!(code = %supplier.supplier_code, user = %actor, "Supplier saved");
    Ok(supplier.id)
}

/// Deletes an unreferenced supplier; one with purchase orders is
/// deactivated. Products that named it as preferred supplier are unlinked.
pub async fn delete_supplier(app: &Backoffice, session: &Session, id: &str) -> Result<DeleteOutcome, ApiError> {
    let actor = session.require_actor()?;

    let outcome = app.db().suppliers().delete_or_deactivate(id).await?;

    info!(supplier_id = %id, outcome = ?outcome, user = %actor, "Supplier delete requested");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{backoffice, clerk};

    #[tokio::test]
    async fn test_save_and_list() {
        let app = backoffice().await;
        let draft = SupplierDraft {
            supplier_code: "S-001".into(),
            name: "Harbor Furniture Works".into(),
            payment_terms: Some("Net 45".into()),
            is_active: true,
            ..Default::default()
        };

        save_supplier(&app, &clerk(), &draft).await.unwrap();

        let suppliers = list_suppliers(&app, false).await;
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].payment_terms.as_deref(), Some("Net 45"));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let app = backoffice().await;
        let draft = SupplierDraft {
            supplier_code: "S-001".into(),
            name: "   ".into(),
            ..Default::default()
        };

        let err = save_supplier(&app, &clerk(), &draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
