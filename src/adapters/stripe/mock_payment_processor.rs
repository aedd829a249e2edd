//! In-process stand-in for the Stripe adapter.
//!
//! Holds customers and subscriptions in memory, records every call, and can
//! be told to fail a given method until [`MockPaymentProcessor::clear_errors`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::ACCOUNT_ID_METADATA_KEY;
use crate::domain::foundation::AccountId;
use crate::ports::{PaymentProcessor, ProcessorCustomer, ProcessorError, ProcessorSubscription};

/// Fake processor; clones share one state.
#[derive(Default, Clone)]
pub struct MockPaymentProcessor {
    state: Arc<Mutex<FakeStripe>>,
}

#[derive(Default)]
struct FakeStripe {
    customers: HashMap<String, ProcessorCustomer>,
    subscriptions: HashMap<String, ProcessorSubscription>,
    failures: HashMap<&'static str, ProcessorError>,
    log: Vec<ProcessorCall>,
}

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorCall {
    GetCustomer(String),
    GetSubscription(String),
    TagCustomerAccount {
        customer_id: String,
        account_id: AccountId,
    },
}

impl ProcessorCall {
    /// Name of the port method, as accepted by [`MockPaymentProcessor::fail`].
    pub fn method(&self) -> &'static str {
        match self {
            ProcessorCall::GetCustomer(_) => "get_customer",
            ProcessorCall::GetSubscription(_) => "get_subscription",
            ProcessorCall::TagCustomerAccount { .. } => "tag_customer_account",
        }
    }
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer: ProcessorCustomer) {
        self.lock().customers.insert(customer.id.clone(), customer);
    }

    pub fn add_customer_with_email(&self, customer_id: &str, email: &str) {
        self.add_customer(ProcessorCustomer {
            id: customer_id.to_string(),
            email: Some(email.to_string()),
            metadata: HashMap::new(),
        });
    }

    pub fn add_subscription(&self, subscription: ProcessorSubscription) {
        self.lock()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Makes every later call to `method` return `error`.
    pub fn fail(&self, method: &'static str, error: ProcessorError) {
        self.lock().failures.insert(method, error);
    }

    pub fn clear_errors(&self) {
        self.lock().failures.clear();
    }

    /// Stored customer, including metadata written by tagging.
    pub fn customer(&self, customer_id: &str) -> Option<ProcessorCustomer> {
        self.lock().customers.get(customer_id).cloned()
    }

    pub fn calls(&self) -> Vec<ProcessorCall> {
        self.lock().log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    fn lock(&self) -> MutexGuard<'_, FakeStripe> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs the call, then hands back the state unless a failure is armed.
    fn enter(&self, call: ProcessorCall) -> Result<MutexGuard<'_, FakeStripe>, ProcessorError> {
        let mut state = self.lock();
        let method = call.method();
        state.log.push(call);
        match state.failures.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProcessorCustomer>, ProcessorError> {
        let state = self.enter(ProcessorCall::GetCustomer(customer_id.to_string()))?;
        Ok(state.customers.get(customer_id).cloned())
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, ProcessorError> {
        let state = self.enter(ProcessorCall::GetSubscription(subscription_id.to_string()))?;
        Ok(state.subscriptions.get(subscription_id).cloned())
    }

    async fn tag_customer_account(
        &self,
        customer_id: &str,
        account_id: AccountId,
    ) -> Result<(), ProcessorError> {
        let mut state = self.enter(ProcessorCall::TagCustomerAccount {
            customer_id: customer_id.to_string(),
            account_id,
        })?;
        if let Some(customer) = state.customers.get_mut(customer_id) {
            customer
                .metadata
                .insert(ACCOUNT_ID_METADATA_KEY.to_string(), account_id.to_string());
        }
        Ok(())
    }
}
