//! Billing domain module.
//!
//! Keeps the locally held subscription and purchase records consistent with
//! the payment processor's notifications.
//!
//! # Module Structure
//!
//! - `plan` - PlanTier and the static price-to-plan table
//! - `status` - SubscriptionStatus and processor status folding
//! - `subscription` - SubscriptionRecord and lifecycle transitions
//! - `purchase` - One-time purchase records and cart splitting
//! - `payloads` - Typed processor objects per event type
//! - `stripe_event` - Event envelope and the closed BillingEvent set
//! - `identity` - Identity resolution context and pure steps
//! - `webhook_verifier` - Signature verification
//! - `webhook_errors` - Error taxonomy and status mapping

mod identity;
mod payloads;
mod plan;
mod purchase;
mod status;
mod stripe_event;
mod subscription;
mod webhook_errors;
mod webhook_verifier;

pub use identity::{
    from_customer_metadata, from_event_metadata, from_subscription_metadata, resolve_locally,
    Resolution, ResolutionContext, ResolutionSource,
};
pub use payloads::{
    account_id_from, CheckoutMode, CheckoutSession, CustomerDetails, InvoiceLine, InvoiceLines,
    InvoiceObject, Metadata, PriceRef, SubscriptionDetails, SubscriptionItem, SubscriptionItems,
    SubscriptionObject, ACCOUNT_ID_METADATA_KEY, ITEM_IDS_METADATA_KEY, ITEM_ID_METADATA_KEY,
    PRICE_ID_METADATA_KEY,
};
pub(crate) use payloads::null_as_default;
pub use plan::{PlanTier, PriceToPlanTable};
pub use purchase::{split_amount, CartCheckout, PurchaseOwner, PurchaseRecord};
pub use status::SubscriptionStatus;
pub use stripe_event::{BillingEvent, StripeEvent, StripeEventData, StripeEventType};
pub use subscription::{SubscriptionChange, SubscriptionRecord};
pub use webhook_errors::{ErrorCategory, WebhookError};
pub use webhook_verifier::{
    sign_payload, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
