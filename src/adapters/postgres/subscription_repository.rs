//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The upsert is a single `INSERT ... ON CONFLICT` statement so concurrent
//! deliveries for one account cannot interleave a read and a write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PlanTier, SubscriptionChange, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{AccountId, DomainError, Timestamp};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    account_id: Uuid,
    external_customer_id: Option<String>,
    external_subscription_id: Option<String>,
    status: String,
    plan: String,
    created_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status: SubscriptionStatus = row
            .status
            .parse()
            .map_err(|_| DomainError::invalid_stored_value("status", &row.status))?;
        let plan: PlanTier = row
            .plan
            .parse()
            .map_err(|_| DomainError::invalid_stored_value("plan", &row.plan))?;

        Ok(SubscriptionRecord {
            account_id: AccountId::from_uuid(row.account_id),
            external_customer_id: row.external_customer_id,
            external_subscription_id: row.external_subscription_id,
            status,
            plan,
            created_at: Timestamp::from_datetime(row.created_at),
            ends_at: row.ends_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_COLUMNS: &str = "account_id, external_customer_id, external_subscription_id, \
                              status, plan, created_at, ends_at";

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

impl PostgresSubscriptionRepository {
    async fn find_one_by(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE {} = $1 ORDER BY updated_at DESC LIMIT 1",
            SELECT_COLUMNS, column
        );

        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(
        &self,
        account_id: AccountId,
        change: SubscriptionChange,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError> {
        let row: SubscriptionRow = sqlx::query_as(
            r#"
            INSERT INTO subscriptions (
                account_id, external_customer_id, external_subscription_id,
                status, plan, created_at, updated_at, ends_at
            ) VALUES ($1, $2, $3, $4, COALESCE($5, 'free'), $6, $6, $7)
            ON CONFLICT (account_id) DO UPDATE SET
                external_customer_id = COALESCE(EXCLUDED.external_customer_id, subscriptions.external_customer_id),
                external_subscription_id = COALESCE(EXCLUDED.external_subscription_id, subscriptions.external_subscription_id),
                status = EXCLUDED.status,
                plan = COALESCE($5, subscriptions.plan),
                ends_at = COALESCE(EXCLUDED.ends_at, subscriptions.ends_at),
                updated_at = EXCLUDED.updated_at
            RETURNING account_id, external_customer_id, external_subscription_id,
                      status, plan, created_at, ends_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(&change.external_customer_id)
        .bind(&change.external_subscription_id)
        .bind(change.status.as_str())
        .bind(change.plan.map(|plan| plan.as_str()))
        .bind(now.as_datetime())
        .bind(change.ends_at.map(|ends_at| *ends_at.as_datetime()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upsert subscription", e))?;

        SubscriptionRecord::try_from(row)
    }

    async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let sql = format!("SELECT {} FROM subscriptions WHERE account_id = $1", SELECT_COLUMNS);

        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(account_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.find_one_by("external_subscription_id", subscription_id)
            .await
    }

    async fn find_by_external_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.find_one_by("external_customer_id", customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn row(status: &str, plan: &str) -> SubscriptionRow {
        SubscriptionRow {
            account_id: Uuid::new_v4(),
            external_customer_id: Some("cus_1".to_string()),
            external_subscription_id: None,
            status: status.to_string(),
            plan: plan.to_string(),
            created_at: Utc::now(),
            ends_at: None,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriptionRecord::try_from(row("past_due", "premium")).unwrap();

        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.plan, PlanTier::Premium);
    }

    #[test]
    fn unknown_stored_status_is_an_integrity_error() {
        let err = SubscriptionRecord::try_from(row("trialing", "premium")).unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStoredValue);
    }
}
