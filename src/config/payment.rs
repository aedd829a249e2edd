//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::billing::{PlanTier, PriceToPlanTable, DEFAULT_TOLERANCE_SECS};

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    #[serde(default)]
    pub stripe_api_key: String,

    /// Stripe webhook signing secret. Without it every delivery gets a 500.
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bound on every Stripe API call, in seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Maximum signature age accepted, in seconds
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_secs: i64,

    /// Static price table: `price_id:tier` pairs, comma separated
    #[serde(default)]
    pub price_plans: String,

    /// Tier for prices missing from the table
    #[serde(default = "default_plan")]
    pub default_plan: String,

    /// Acknowledge and ignore test-mode events
    #[serde(default)]
    pub require_livemode: bool,
}

impl PaymentConfig {
    /// Whether the API key is a live-mode key
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// API key, wrapped so it cannot be logged by accident
    pub fn api_key(&self) -> SecretString {
        SecretString::new(self.stripe_api_key.clone())
    }

    /// Webhook signing secret, if configured and non-empty
    pub fn webhook_secret(&self) -> Option<SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::new(s.to_string()))
    }

    /// Get API timeout as Duration
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Builds the Plan Mapper table from `price_plans` and `default_plan`
    pub fn plan_table(&self) -> Result<PriceToPlanTable, ValidationError> {
        let default_plan: PlanTier = self
            .default_plan
            .parse()
            .map_err(|e| ValidationError::InvalidPriceTable(format!("{}", e)))?;

        let table = PriceToPlanTable::parse(&self.price_plans)
            .map_err(|e| ValidationError::InvalidPriceTable(format!("{}", e)))?;

        Ok(table.with_default(default_plan))
    }

    /// Validate payment configuration
    ///
    /// A missing webhook secret is not an error here: the service starts and
    /// answers deliveries with 500 until one is configured.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("payment.stripe_api_key"));
        }
        ValidationError::ensure_prefix("payment.stripe_api_key", &self.stripe_api_key, "sk_")?;
        if let Some(secret) = self.webhook_secret() {
            ValidationError::ensure_prefix(
                "payment.stripe_webhook_secret",
                secret.expose_secret(),
                "whsec_",
            )?;
        }

        ValidationError::ensure_range(
            "payment.api_timeout_secs",
            self.api_timeout_secs as i64,
            1,
            60,
        )?;
        ValidationError::ensure_range(
            "payment.signature_tolerance_secs",
            self.signature_tolerance_secs,
            1,
            3600,
        )?;

        self.plan_table()?;
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: None,
            api_base_url: default_api_base_url(),
            api_timeout_secs: default_api_timeout(),
            signature_tolerance_secs: default_signature_tolerance(),
            price_plans: String::new(),
            default_plan: default_plan(),
            require_livemode: false,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_signature_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_plan() -> String {
    "standard".to_string()
}
