//! Payment processor port for the reads and writes reconciliation needs.
//!
//! Only three calls cross this boundary: fetch a customer, fetch a
//! subscription, and tag a customer with our account id. Every call is
//! bounded by the adapter's timeout; none is retried here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{Metadata, WebhookError};
use crate::domain::foundation::{AccountId, DomainError, ErrorCode};

/// Port for payment processor lookups.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Get customer by processor id.
    ///
    /// Returns `None` for unknown or deleted customers.
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProcessorCustomer>, ProcessorError>;

    /// Get subscription by processor id.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, ProcessorError>;

    /// Store our account id in the customer's metadata.
    async fn tag_customer_account(
        &self,
        customer_id: &str,
        account_id: AccountId,
    ) -> Result<(), ProcessorError>;
}

/// Customer record as held by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorCustomer {
    /// Processor's customer id.
    pub id: String,

    /// Customer email, if the processor has one.
    pub email: Option<String>,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Subscription record as held by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSubscription {
    /// Processor's subscription id.
    pub id: String,

    /// Processor's customer id.
    pub customer_id: String,

    /// Processor-reported status string.
    pub status: String,

    /// Price of the first subscription item.
    pub price_id: Option<String>,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Errors from processor calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProcessorError {
    /// Error code for categorization.
    pub code: ProcessorErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Processor's own error code, if any.
    pub provider_code: Option<String>,
}

impl ProcessorError {
    /// Create a new processor error.
    pub fn new(code: ProcessorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    /// Attach the processor's error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::NetworkError, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::Timeout, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::AuthenticationError, message)
    }

    /// Create a generic processor API error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::ProviderError, message)
    }

    /// Whether the failure is the kind a later redelivery may not hit.
    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl From<ProcessorError> for DomainError {
    fn from(err: ProcessorError) -> Self {
        DomainError::new(ErrorCode::ProcessorError, err.message)
            .with_detail("processor_code", err.code.to_string())
    }
}

impl From<ProcessorError> for WebhookError {
    fn from(err: ProcessorError) -> Self {
        WebhookError::Processor(err.to_string())
    }
}

/// Processor error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// Call exceeded its timeout.
    Timeout,

    /// API authentication failed.
    AuthenticationError,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Response could not be decoded.
    InvalidResponse,

    /// Processor API error.
    ProviderError,
}

impl ProcessorErrorCode {
    /// Check if this error type is typically transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProcessorErrorCode::NetworkError
                | ProcessorErrorCode::Timeout
                | ProcessorErrorCode::RateLimitExceeded
                | ProcessorErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for ProcessorErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessorErrorCode::NetworkError => "network_error",
            ProcessorErrorCode::Timeout => "timeout",
            ProcessorErrorCode::AuthenticationError => "authentication_error",
            ProcessorErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ProcessorErrorCode::InvalidResponse => "invalid_response",
            ProcessorErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
