//! SubscriptionRepository port - storage for the per-account subscription record.
//!
//! Exactly one record per account. Rows are never deleted; cancellation is a
//! status transition.

use async_trait::async_trait;

use crate::domain::billing::{SubscriptionChange, SubscriptionRecord};
use crate::domain::foundation::{AccountId, DomainError, Timestamp};

/// Port for subscription record persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert or update the account's record with the given change.
    ///
    /// Must match [`SubscriptionRecord::upsert`]: insert when absent,
    /// otherwise last-write-wins per field, `created_at` kept from the
    /// first insert. Applying the same change twice leaves the same state.
    /// Returns the stored record.
    async fn upsert(
        &self,
        account_id: AccountId,
        change: SubscriptionChange,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError>;

    /// Find the record for an account.
    async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Find the record holding a processor subscription id.
    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Find the record holding a processor customer id.
    async fn find_by_external_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
