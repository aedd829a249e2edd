//! AccountDirectory port - read-only view of the platform's account store.
//!
//! The account store belongs to the surrounding application. Reconciliation
//! only ever asks it one question: which account owns this email?

use async_trait::async_trait;

use crate::domain::foundation::{AccountId, CustomerEmail, DomainError};

/// Port for looking up accounts by email.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find the account registered with the given email.
    ///
    /// Emails are compared case-insensitively. Returns `None` when no account
    /// uses the address.
    async fn find_account_by_email(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<AccountId>, DomainError>;
}
