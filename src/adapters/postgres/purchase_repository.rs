//! PostgreSQL implementation of PurchaseRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PurchaseOwner, PurchaseRecord};
use crate::domain::foundation::{
    AccountId, CustomerEmail, DomainError, PurchaseId, Timestamp,
};
use crate::ports::{InsertOutcome, PurchaseRepository};

/// PostgreSQL implementation of the PurchaseRepository port.
///
/// Relies on the `(checkout_reference, item_id)` unique constraint for
/// idempotency.
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    /// Creates a new PostgresPurchaseRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    account_id: Option<Uuid>,
    customer_email: Option<String>,
    item_id: String,
    payment_reference: Option<String>,
    checkout_reference: String,
    amount_cents: i64,
    purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let owner = match (row.account_id, row.customer_email) {
            (Some(account_id), _) => PurchaseOwner::Account(AccountId::from_uuid(account_id)),
            (None, Some(email)) => PurchaseOwner::Guest(
                CustomerEmail::new(&email)
                    .map_err(|_| DomainError::invalid_stored_value("customer_email", &email))?,
            ),
            (None, None) => {
                return Err(DomainError::invalid_stored_value("owner", "none")
                    .with_detail("purchase_id", row.id.to_string()))
            }
        };

        Ok(PurchaseRecord {
            id: PurchaseId::from_uuid(row.id),
            owner,
            item_id: row.item_id,
            payment_reference: row.payment_reference,
            checkout_reference: row.checkout_reference,
            amount_cents: row.amount_cents,
            purchased_at: Timestamp::from_datetime(row.purchased_at),
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn insert_if_absent(&self, record: &PurchaseRecord) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, account_id, customer_email, item_id, payment_reference,
                checkout_reference, amount_cents, purchased_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (checkout_reference, item_id) DO NOTHING
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.account_id().map(|id| *id.as_uuid()))
        .bind(record.customer_email().map(|email| email.as_str()))
        .bind(&record.item_id)
        .bind(&record.payment_reference)
        .bind(&record.checkout_reference)
        .bind(record.amount_cents)
        .bind(record.purchased_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert purchase: {}", e)))?;

        Ok(if result.rows_affected() == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn find_by_checkout(
        &self,
        checkout_reference: &str,
    ) -> Result<Vec<PurchaseRecord>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, customer_email, item_id, payment_reference,
                   checkout_reference, amount_cents, purchased_at
            FROM purchases
            WHERE checkout_reference = $1
            ORDER BY item_id
            "#,
        )
        .bind(checkout_reference)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find purchases: {}", e)))?;

        rows.into_iter().map(PurchaseRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn row(account_id: Option<Uuid>, email: Option<&str>) -> PurchaseRow {
        PurchaseRow {
            id: Uuid::new_v4(),
            account_id,
            customer_email: email.map(String::from),
            item_id: "itn_a".to_string(),
            payment_reference: Some("pi_1".to_string()),
            checkout_reference: "cs_1".to_string(),
            amount_cents: 1000,
            purchased_at: Utc::now(),
        }
    }

    #[test]
    fn guest_row_converts_to_guest_purchase() {
        let record = PurchaseRecord::try_from(row(None, Some("g@example.com"))).unwrap();

        assert!(record.account_id().is_none());
        assert_eq!(record.customer_email().unwrap().as_str(), "g@example.com");
    }

    #[test]
    fn ownerless_row_is_rejected() {
        let err = PurchaseRecord::try_from(row(None, None)).unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStoredValue);
    }
}
