//! Stripe processor adapter.
//!
//! Implements the `PaymentProcessor` port for Stripe:
//! - Customer and subscription lookups
//! - Tagging customers with the platform account id
//!
//! Every call is bounded by the client timeout. The API key is held as a
//! `secrecy::SecretString` and never logged.

mod api_types;
mod mock_payment_processor;
mod stripe_adapter;

pub use api_types::{StripeCustomer, StripeSubscription};
pub use mock_payment_processor::{MockPaymentProcessor, ProcessorCall};
pub use stripe_adapter::{StripeConfig, StripeProcessorAdapter};
