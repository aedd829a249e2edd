//! PostgreSQL implementation of DeliveryLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{DeliveryLog, DeliveryOutcome, DeliveryRecord};

/// Delivery ledger in the `billing_deliveries` table.
pub struct PostgresDeliveryLog {
    pool: PgPool,
}

impl PostgresDeliveryLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    event_id: String,
    event_type: String,
    received_at: DateTime<Utc>,
    outcome: String,
    detail: Option<String>,
    payload: serde_json::Value,
    delivery_count: i32,
}

impl TryFrom<DeliveryRow> for DeliveryRecord {
    type Error = DomainError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let outcome = DeliveryOutcome::parse(&row.outcome)
            .ok_or_else(|| DomainError::invalid_stored_value("outcome", &row.outcome))?;

        Ok(DeliveryRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            received_at: Timestamp::from_datetime(row.received_at),
            outcome,
            detail: row.detail,
            payload: row.payload,
            delivery_count: row.delivery_count,
        })
    }
}

#[async_trait]
impl DeliveryLog for PostgresDeliveryLog {
    async fn record(&self, record: DeliveryRecord) -> Result<DeliveryRecord, DomainError> {
        let row: DeliveryRow = sqlx::query_as(
            r#"
            INSERT INTO billing_deliveries (
                event_id, event_type, received_at, outcome, detail, payload, delivery_count
            ) VALUES ($1, $2, $3, $4, $5, $6, 1)
            ON CONFLICT (event_id) DO UPDATE SET
                received_at = EXCLUDED.received_at,
                outcome = EXCLUDED.outcome,
                detail = EXCLUDED.detail,
                payload = EXCLUDED.payload,
                delivery_count = billing_deliveries.delivery_count + 1
            RETURNING event_id, event_type, received_at, outcome, detail, payload, delivery_count
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.received_at.as_datetime())
        .bind(record.outcome.as_str())
        .bind(&record.detail)
        .bind(&record.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record delivery: {}", e)))?;

        DeliveryRecord::try_from(row)
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<DeliveryRecord>, DomainError> {
        let row: Option<DeliveryRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, received_at, outcome, detail, payload, delivery_count
            FROM billing_deliveries
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find delivery: {}", e)))?;

        row.map(DeliveryRecord::try_from).transpose()
    }
}
