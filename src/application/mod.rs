//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    BillingEventDispatcher, DispatchReport, HandleBillingWebhookCommand,
    HandleBillingWebhookHandler, HandleBillingWebhookResult, IdentityResolver,
    ReconcileSubscriptionHandler, RecordPurchaseHandler,
};
