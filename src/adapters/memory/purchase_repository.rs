//! In-memory PurchaseRepository.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::PurchaseRecord;
use crate::domain::foundation::DomainError;
use crate::ports::{InsertOutcome, PurchaseRepository};

/// In-memory storage for purchase rows, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPurchaseRepository {
    records: Arc<RwLock<Vec<PurchaseRecord>>>,
}

impl InMemoryPurchaseRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored purchases.
    pub async fn all(&self) -> Vec<PurchaseRecord> {
        self.records.read().await.clone()
    }

    /// Number of stored purchases.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn insert_if_absent(&self, record: &PurchaseRecord) -> Result<InsertOutcome, DomainError> {
        let mut records = self.records.write().await;
        let key = record.idempotency_key();

        if records.iter().any(|existing| existing.idempotency_key() == key) {
            return Ok(InsertOutcome::Duplicate);
        }

        records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_checkout(
        &self,
        checkout_reference: &str,
    ) -> Result<Vec<PurchaseRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.checkout_reference == checkout_reference)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{CartCheckout, PurchaseOwner};
    use crate::domain::foundation::{AccountId, Timestamp};

    fn records() -> Vec<PurchaseRecord> {
        CartCheckout {
            checkout_reference: "cs_1".to_string(),
            payment_reference: None,
            items: vec!["it_a".to_string(), "it_b".to_string()],
            total_cents: 400,
            completed_at: Timestamp::now(),
        }
        .into_records(PurchaseOwner::Account(AccountId::new()))
    }

    #[tokio::test]
    async fn duplicate_key_is_not_inserted_twice() {
        let repo = InMemoryPurchaseRepository::new();
        let first = records();
        let redelivered = records();

        for record in &first {
            assert_eq!(repo.insert_if_absent(record).await.unwrap(), InsertOutcome::Inserted);
        }
        for record in &redelivered {
            assert_eq!(repo.insert_if_absent(record).await.unwrap(), InsertOutcome::Duplicate);
        }

        assert_eq!(repo.count().await, 2);
        // the original rows are untouched
        let stored = repo.find_by_checkout("cs_1").await.unwrap();
        assert_eq!(stored[0].id, first[0].id);
    }
}
