//! # Supplier Repository
//!
//! Database operations for suppliers.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use stockwise_core::{DeleteOutcome, Supplier, SupplierDraft};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_address, encode_address, generate_id};

const SUPPLIER_COLUMNS: &str = r#"
    id, supplier_code, name, contact_person, phone, email, tax_id,
    address, payment_terms, notes, is_active, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: String,
    supplier_code: String,
    name: String,
    contact_person: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    tax_id: Option<String>,
    address: Option<String>,
    payment_terms: Option<String>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SupplierRow> for Supplier {
    type Error = DbError;

    fn try_from(row: SupplierRow) -> DbResult<Self> {
        Ok(Supplier {
            address: decode_address(row.address.as_deref())?,
            id: row.id,
            supplier_code: row.supplier_code,
            name: row.name,
            contact_person: row.contact_person,
            phone: row.phone,
            email: row.email,
            tax_id: row.tax_id,
            payment_terms: row.payment_terms,
            notes: row.notes,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers, newest first.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE (?1 OR is_active = 1) \
             ORDER BY created_at DESC, supplier_code"
        );

        let rows = sqlx::query_as::<_, SupplierRow>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Supplier::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        fetch_supplier(&mut conn, id).await
    }

    /// Creates or updates a supplier. `supplier_code` must be unique.
    pub async fn upsert(&self, draft: &SupplierDraft) -> DbResult<Supplier> {
        let id = draft.id.clone().unwrap_or_else(generate_id);
        let now = Utc::now();
        let address = encode_address(draft.address.as_ref())?;

        debug!(id = %id, code = %draft.supplier_code, "Saving supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, supplier_code, name, contact_person, phone, email, tax_id,
                address, payment_terms, notes, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT(id) DO UPDATE SET
                supplier_code = excluded.supplier_code,
                name = excluded.name,
                contact_person = excluded.contact_person,
                phone = excluded.phone,
                email = excluded.email,
                tax_id = excluded.tax_id,
                address = excluded.address,
                payment_terms = excluded.payment_terms,
                notes = excluded.notes,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(draft.supplier_code.trim())
        .bind(draft.name.trim())
        .bind(&draft.contact_person)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(&draft.tax_id)
        .bind(address)
        .bind(&draft.payment_terms)
        .bind(&draft.notes)
        .bind(draft.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == "suppliers.supplier_code" => {
                DbError::duplicate(field, draft.supplier_code.trim())
            }
            other => other,
        })?;

        let mut conn = self.pool.acquire().await?;
        let supplier = fetch_supplier(&mut conn, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", &id))?;

        info!(id = %supplier.id, code = %supplier.supplier_code, "Supplier saved");
        Ok(supplier)
    }

    /// Deletes a supplier, or deactivates one that purchase orders still
    /// reference. Products pointing at a deleted supplier lose the link
    /// (`ON DELETE SET NULL`).
    pub async fn delete_or_deactivate(&self, id: &str) -> DbResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        if fetch_supplier(&mut tx, id).await?.is_none() {
            return Err(DbError::not_found("Supplier", id));
        }

        let referenced: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE supplier_id = ?1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let outcome = if referenced != 0 {
            sqlx::query("UPDATE suppliers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deactivated
        } else {
            sqlx::query("DELETE FROM suppliers WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deleted
        };

        tx.commit().await?;

        info!(id = %id, outcome = ?outcome, "Supplier removed");
        Ok(outcome)
    }
}

pub(crate) async fn fetch_supplier(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Supplier>> {
    let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");

    sqlx::query_as::<_, SupplierRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Supplier::try_from)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockwise_core::{ActorId, ProductDraft};

    #[tokio::test]
    async fn test_delete_unlinks_products() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let supplier = db
            .suppliers()
            .upsert(&SupplierDraft {
                supplier_code: "S001".into(),
                name: "Chairs Ltd".into(),
                is_active: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let product = db
            .products()
            .upsert(
                &ProductDraft {
                    sku: "CHAIR-01".into(),
                    name: "Office Chair".into(),
                    unit: "pcs".into(),
                    supplier_id: Some(supplier.id.clone()),
                    is_active: true,
                    ..Default::default()
                },
                &ActorId::new("u-1"),
            )
            .await
            .unwrap();

        let outcome = db.suppliers().delete_or_deactivate(&supplier.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(product.supplier_id.is_none());
    }
}
