//! In-memory DeliveryLog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{DeliveryLog, DeliveryRecord};

/// In-memory delivery ledger keyed by event id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeliveryLog {
    records: Arc<RwLock<HashMap<String, DeliveryRecord>>>,
}

impl InMemoryDeliveryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct events recorded.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DeliveryLog for InMemoryDeliveryLog {
    async fn record(&self, mut record: DeliveryRecord) -> Result<DeliveryRecord, DomainError> {
        let mut records = self.records.write().await;

        if let Some(previous) = records.get(&record.event_id) {
            record.delivery_count = previous.delivery_count + 1;
        } else {
            record.delivery_count = 1;
        }

        records.insert(record.event_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<DeliveryRecord>, DomainError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }
}
