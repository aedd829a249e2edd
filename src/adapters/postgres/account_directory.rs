//! PostgreSQL implementation of AccountDirectory.
//!
//! Reads the platform's `accounts` table. Emails are compared
//! case-insensitively.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{AccountId, CustomerEmail, DomainError};
use crate::ports::AccountDirectory;

/// Read-only view of the accounts table.
pub struct PostgresAccountDirectory {
    pool: PgPool,
}

impl PostgresAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PostgresAccountDirectory {
    async fn find_account_by_email(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<AccountId>, DomainError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM accounts
            WHERE lower(email) = $1
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to look up account: {}", e)))?;

        Ok(id.map(AccountId::from_uuid))
    }
}
