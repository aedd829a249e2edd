//! Service configuration
//!
//! Read from environment variables prefixed `ITINERARY_BILLING`, with `__`
//! between nesting levels:
//!
//! ```text
//! ITINERARY_BILLING__SERVER__PORT=8080
//! ITINERARY_BILLING__DATABASE__URL=postgres://billing@db/billing
//! ITINERARY_BILLING__DATABASE__POOL__MAX_CONNECTIONS=10
//! ITINERARY_BILLING__PAYMENT__STRIPE_WEBHOOK_SECRET=whsec_...
//! ITINERARY_BILLING__PAYMENT__PRICE_PLANS=price_std:standard,price_prem:premium
//! ```
//!
//! A `.env` file in the working directory is loaded first when present.

mod database;
mod error;
mod payment;
mod server;

pub use database::{DatabaseConfig, MigrationConfig, PoolConfig};
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Prefix shared by every configuration variable.
pub const ENV_PREFIX: &str = "ITINERARY_BILLING";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Loads `.env` (if any) and the process environment.
    ///
    /// # Errors
    ///
    /// `ConfigError::Load` when a variable cannot be converted to its field type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let source = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(source)
    }

    /// Deserializes an already assembled `config::Config`.
    pub fn from_config(source: config::Config) -> Result<Self, ConfigError> {
        Ok(source.try_deserialize()?)
    }

    /// Loads and validates in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn from_overrides(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        AppConfig::from_config(builder.build().unwrap())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("payment.stripe_api_key", "sk_test_abc"),
        ("payment.stripe_webhook_secret", "whsec_abc"),
    ];

    #[test]
    fn minimal_config_validates_with_memory_stores() {
        let config = from_overrides(MINIMAL).unwrap();

        assert!(config.validate().is_ok());
        assert!(!config.database.is_configured());
        assert!(!config.server.is_production());
        assert_eq!(config.server.port, 8080);
        assert!(!config.payment.require_livemode);
    }

    #[test]
    fn nested_pool_and_price_table() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            ("database.url", "postgres://billing@localhost/billing"),
            ("database.pool.max_connections", "4"),
            ("database.migrations.run_on_startup", "true"),
            ("payment.price_plans", "price_std:standard,price_prem:premium"),
        ]);

        let config = from_overrides(&pairs).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.database.pool.max_connections, 4);
        assert!(config.database.migrations.run_on_startup);
        assert_eq!(config.payment.plan_table().unwrap().len(), 2);
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let config = from_overrides(&[("payment.stripe_webhook_secret", "whsec_abc")]).unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("payment.stripe_api_key"))
        );
    }

    #[test]
    fn unparseable_port_is_a_load_error() {
        let result = from_overrides(&[("server.port", "eighty")]);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn reads_prefixed_environment_variables() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ITINERARY_BILLING__SERVER__ENVIRONMENT", "production");
        env::set_var("ITINERARY_BILLING__PAYMENT__REQUIRE_LIVEMODE", "true");
        env::set_var("ITINERARY_BILLING__PAYMENT__STRIPE_API_KEY", "sk_live_abc");
        let result = AppConfig::load();
        env::remove_var("ITINERARY_BILLING__SERVER__ENVIRONMENT");
        env::remove_var("ITINERARY_BILLING__PAYMENT__REQUIRE_LIVEMODE");
        env::remove_var("ITINERARY_BILLING__PAYMENT__STRIPE_API_KEY");

        let config = result.unwrap();
        assert!(config.server.is_production());
        assert!(config.payment.require_livemode);
        assert!(config.payment.is_live_mode());
        assert_eq!(config.server.log_format(), LogFormat::Json);
    }
}
