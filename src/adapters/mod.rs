//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum routes for webhook deliveries and health
//! - `memory` - in-memory stores for tests and local runs
//! - `postgres` - sqlx-backed stores
//! - `stripe` - Stripe API client and a mock processor

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use http::{billing_router, BillingAppState};
pub use memory::{
    InMemoryAccountDirectory, InMemoryDeliveryLog, InMemoryPurchaseRepository,
    InMemorySubscriptionRepository,
};
pub use postgres::{
    PostgresAccountDirectory, PostgresDeliveryLog, PostgresPurchaseRepository,
    PostgresSubscriptionRepository,
};
pub use stripe::{MockPaymentProcessor, StripeConfig, StripeProcessorAdapter};
