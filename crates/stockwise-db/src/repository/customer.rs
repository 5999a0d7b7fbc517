//! # Customer Repository
//!
//! Database operations for customers. The address is a JSON column, so rows
//! are read into [`CustomerRow`] and converted.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use stockwise_core::{Customer, CustomerDraft, DeleteOutcome, PriceTier};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{decode_address, encode_address, generate_id};

const CUSTOMER_COLUMNS: &str = r#"
    id, customer_code, name, level, contact_person, phone, email, tax_id,
    address, payment_terms, notes, is_active, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    customer_code: String,
    name: String,
    level: PriceTier,
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

impl TryFrom<CustomerRow> for Customer {
    type Error = DbError;

    fn try_from(row: CustomerRow) -> DbResult<Self> {
        Ok(Customer {
            address: decode_address(row.address.as_deref())?,
            id: row.id,
            customer_code: row.customer_code,
            name: row.name,
            level: row.level,
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

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists customers, newest first.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE (?1 OR is_active = 1) \
             ORDER BY created_at DESC, customer_code"
        );

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Creates or updates a customer. `customer_code` must be unique.
    pub async fn upsert(&self, draft: &CustomerDraft) -> DbResult<Customer> {
        let id = draft.id.clone().unwrap_or_else(generate_id);
        let now = Utc::now();
        let address = encode_address(draft.address.as_ref())?;

        debug!(id = %id, code = %draft.customer_code, "Saving customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, customer_code, name, level, contact_person, phone, email, tax_id,
                address, payment_terms, notes, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            ON CONFLICT(id) DO UPDATE SET
                customer_code = excluded.customer_code,
                name = excluded.name,
                level = excluded.level,
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
        .bind(draft.customer_code.trim())
        .bind(draft.name.trim())
        .bind(draft.level)
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
            DbError::UniqueViolation { field, .. } if field == "customers.customer_code" => {
                DbError::duplicate(field, draft.customer_code.trim())
            }
            other => other,
        })?;

        let mut conn = self.pool.acquire().await?;
        let customer = fetch_customer(&mut conn, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &id))?;

        info!(id = %customer.id, code = %customer.customer_code, "Customer saved");
        Ok(customer)
    }

    /// Deletes a customer, or deactivates one that sales orders still reference.
    pub async fn delete_or_deactivate(&self, id: &str) -> DbResult<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        if fetch_customer(&mut tx, id).await?.is_none() {
            return Err(DbError::not_found("Customer", id));
        }

        let referenced: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales_orders WHERE customer_id = ?1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let outcome = if referenced != 0 {
            sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deactivated
        } else {
            sqlx::query("DELETE FROM customers WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deleted
        };

        tx.commit().await?;

        info!(id = %id, outcome = ?outcome, "Customer removed");
        Ok(outcome)
    }
}

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

    sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Customer::try_from)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockwise_core::Address;

    fn draft(code: &str) -> CustomerDraft {
        CustomerDraft {
            customer_code: code.to_string(),
            name: "Acme Trading".to_string(),
            level: PriceTier::Gold,
            tax_id: Some("12345678".to_string()),
            address: Some(Address {
                zip_code: "100".into(),
                city: "Taipei".into(),
                district: "Zhongzheng".into(),
                street: "1 Main Rd".into(),
            }),
            is_active: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.upsert(&draft("C001")).await.unwrap();
        assert_eq!(created.level, PriceTier::Gold);
        assert_eq!(created.address.as_ref().unwrap().city, "Taipei");

        let mut edit = draft("C001");
        edit.id = Some(created.id.clone());
        edit.level = PriceTier::Silver;
        edit.address = None;
        let updated = repo.upsert(&edit).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.level, PriceTier::Silver);
        assert!(updated.address.is_none());
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(repo.list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.upsert(&draft("C001")).await.unwrap();
        let err = repo.upsert(&draft("C001")).await.unwrap_err();
        assert!(err.is_unique_violation_on("customers.customer_code"));
    }

    #[tokio::test]
    async fn test_unreferenced_customer_is_deleted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.upsert(&draft("C001")).await.unwrap();
        assert_eq!(
            repo.delete_or_deactivate(&created.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }
}
