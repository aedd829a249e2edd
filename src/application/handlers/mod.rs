//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod billing;

pub use billing::{
    BillingEventDispatcher, DispatchReport, HandleBillingWebhookCommand,
    HandleBillingWebhookHandler, HandleBillingWebhookResult, HandledEvent, IdentityResolver,
    ReconcileSubscriptionHandler, ReconcileSubscriptionResult, RecordPurchaseHandler,
    RecordPurchaseResult, ResolverStep,
};
