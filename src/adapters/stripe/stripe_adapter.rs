//! Stripe processor adapter.
//!
//! Implements the `PaymentProcessor` port against the Stripe REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripeProcessorAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::api_types::{StripeCustomer, StripeErrorBody, StripeSubscription};
use crate::domain::billing::ACCOUNT_ID_METADATA_KEY;
use crate::domain::foundation::AccountId;
use crate::ports::{
    PaymentProcessor, ProcessorCustomer, ProcessorError, ProcessorErrorCode, ProcessorSubscription,
};

/// Default bound on every Stripe call.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Bound on each API call.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Stripe processor adapter.
pub struct StripeProcessorAdapter {
    config: StripeConfig,
    base_url: reqwest::Url,
    http_client: reqwest::Client,
}

impl StripeProcessorAdapter {
    /// Create a new adapter. The HTTP client carries the configured timeout.
    pub fn new(config: StripeConfig) -> Result<Self, ProcessorError> {
        let base_url = reqwest::Url::parse(&config.api_base_url).map_err(|e| {
            ProcessorError::provider(format!("Invalid Stripe base URL {}: {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProcessorError::provider(format!(
                "Stripe base URL {} cannot carry a path",
                config.api_base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProcessorError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// `{base}/v1/{resource}/{id}` with `id` encoded as a single segment.
    fn object_url(&self, resource: &str, id: &str) -> Result<reqwest::Url, ProcessorError> {
        if matches!(id, "" | "." | "..") {
            return Err(ProcessorError::provider(format!("Invalid {} id {:?}", resource, id)));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", resource, id]);
        }
        Ok(url)
    }

    /// GET an object, mapping 404 to `None`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: &str,
    ) -> Result<Option<T>, ProcessorError> {
        let response = self
            .http_client
            .get(self.object_url(resource, id)?)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let object = response.json().await.map_err(|e| {
            ProcessorError::new(
                ProcessorErrorCode::InvalidResponse,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(Some(object))
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessorAdapter {
    async fn get_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProcessorCustomer>, ProcessorError> {
        let customer: Option<StripeCustomer> = self.fetch("customers", customer_id).await?;

        Ok(customer
            .filter(|customer| !customer.deleted)
            .map(ProcessorCustomer::from))
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProcessorSubscription>, ProcessorError> {
        let subscription: Option<StripeSubscription> =
            self.fetch("subscriptions", subscription_id).await?;

        Ok(subscription.map(ProcessorSubscription::from))
    }

    async fn tag_customer_account(
        &self,
        customer_id: &str,
        account_id: AccountId,
    ) -> Result<(), ProcessorError> {
        let key = format!("metadata[{}]", ACCOUNT_ID_METADATA_KEY);
        let value = account_id.to_string();
        let params = [(key.as_str(), value.as_str())];

        let response = self
            .http_client
            .post(self.object_url("customers", customer_id)?)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}

fn map_transport_error(err: reqwest::Error) -> ProcessorError {
    if err.is_timeout() {
        ProcessorError::timeout(err.to_string())
    } else {
        ProcessorError::network(err.to_string())
    }
}

async fn error_from_response(response: reqwest::Response) -> ProcessorError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<StripeErrorBody>(&body).ok();

    let message = parsed
        .as_ref()
        .and_then(|b| b.error.message.clone())
        .unwrap_or(body);

    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ProcessorErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => ProcessorErrorCode::RateLimitExceeded,
        _ => ProcessorErrorCode::ProviderError,
    };

    let error = ProcessorError::new(code, format!("Stripe API error ({}): {}", status, message));
    match parsed.and_then(|b| b.error.code) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}
