//! In-memory AccountDirectory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{AccountId, CustomerEmail, DomainError};
use crate::ports::AccountDirectory;

/// Email to account map standing in for the platform's account store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<CustomerEmail, AccountId>>>,
}

impl InMemoryAccountDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account under an email.
    pub async fn register(&self, email: CustomerEmail, account_id: AccountId) {
        self.accounts.write().await.insert(email, account_id);
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_account_by_email(
        &self,
        email: &CustomerEmail,
    ) -> Result<Option<AccountId>, DomainError> {
        Ok(self.accounts.read().await.get(email).copied())
    }
}
