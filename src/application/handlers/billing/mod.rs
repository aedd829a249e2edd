//! Billing webhook handlers.
//!
//! - `identity_resolver` - ordered account resolution chain
//! - `reconcile_subscription` - subscription lifecycle transitions
//! - `record_purchase` - one-time purchases and cart splitting
//! - `dispatcher` - event routing with error and panic absorption
//! - `handle_billing_webhook` - verify, dispatch, record the delivery

mod dispatcher;
mod handle_billing_webhook;
mod identity_resolver;
mod reconcile_subscription;
mod record_purchase;

pub use dispatcher::{BillingEventDispatcher, DispatchReport, HandledEvent};
pub use handle_billing_webhook::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
};
pub use identity_resolver::{IdentityResolver, ResolverStep, PURCHASE_CHAIN, SUBSCRIPTION_CHAIN};
pub use reconcile_subscription::{ReconcileSubscriptionHandler, ReconcileSubscriptionResult};
pub use record_purchase::{RecordPurchaseHandler, RecordPurchaseResult};
