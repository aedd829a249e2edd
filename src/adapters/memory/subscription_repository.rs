//! In-memory SubscriptionRepository.
//!
//! Holds one record per account behind a single write lock, so an upsert is
//! atomic with respect to concurrent upserts for the same account.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::{SubscriptionChange, SubscriptionRecord};
use crate::domain::foundation::{AccountId, DomainError, Timestamp};
use crate::ports::SubscriptionRepository;

/// In-memory storage for subscription records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    records: Arc<RwLock<HashMap<AccountId, SubscriptionRecord>>>,
}

impl InMemorySubscriptionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly (tests, local fixtures).
    pub async fn insert(&self, record: SubscriptionRecord) {
        self.records.write().await.insert(record.account_id, record);
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn upsert(
        &self,
        account_id: AccountId,
        change: SubscriptionChange,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, DomainError> {
        let mut records = self.records.write().await;
        let existing = records.remove(&account_id);
        let record = SubscriptionRecord::upsert(existing, account_id, change, now);
        records.insert(account_id, record.clone());
        Ok(record)
    }

    async fn find_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.records.read().await.get(&account_id).cloned())
    }

    async fn find_by_external_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.external_subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn find_by_external_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.external_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{PlanTier, SubscriptionStatus};

    #[tokio::test]
    async fn upsert_inserts_then_updates_in_place() {
        let repo = InMemorySubscriptionRepository::new();
        let account_id = AccountId::new();

        repo.upsert(
            account_id,
            SubscriptionChange::checkout_completed(
                Some("cus_1".to_string()),
                Some("sub_1".to_string()),
                PlanTier::Premium,
            ),
            Timestamp::now(),
        )
        .await
        .unwrap();
        let record = repo
            .upsert(
                account_id,
                SubscriptionChange::payment_failed(None, None),
                Timestamp::now(),
            )
            .await
            .unwrap();

        assert_eq!(repo.count().await, 1);
        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.plan, PlanTier::Premium);
    }

    #[tokio::test]
    async fn finds_by_external_ids() {
        let repo = InMemorySubscriptionRepository::new();
        let account_id = AccountId::new();
        repo.upsert(
            account_id,
            SubscriptionChange::checkout_completed(
                Some("cus_1".to_string()),
                Some("sub_1".to_string()),
                PlanTier::Standard,
            ),
            Timestamp::now(),
        )
        .await
        .unwrap();

        let by_sub = repo.find_by_external_subscription_id("sub_1").await.unwrap();
        let by_cus = repo.find_by_external_customer_id("cus_1").await.unwrap();

        assert_eq!(by_sub.unwrap().account_id, account_id);
        assert_eq!(by_cus.unwrap().account_id, account_id);
        assert!(repo
            .find_by_external_subscription_id("sub_other")
            .await
            .unwrap()
            .is_none());
    }
}
