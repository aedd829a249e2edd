//! Identity resolution inputs and the pure resolution steps.
//!
//! A [`ResolutionContext`] collects everything an event tells us about who it
//! belongs to. The pure steps here read only the context; the steps that need
//! the processor or a store live in the application layer and reuse
//! [`from_customer_metadata`] for the customer record they fetch.

use std::fmt;

use super::payloads::{account_id_from, CheckoutSession, InvoiceObject, Metadata, SubscriptionObject};
use crate::domain::foundation::{AccountId, CustomerEmail};

/// Where a resolved account id came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// `metadata.account_id` on the event's primary object.
    EventMetadata,
    /// Metadata on the subscription the event refers to.
    SubscriptionMetadata,
    /// Metadata on the live customer record.
    CustomerMetadata,
    /// Account matched by the live customer record's email.
    CustomerEmail,
    /// Account matched by an email carried on the event itself.
    EventEmail,
    /// Local subscription record matched by subscription id.
    StoredSubscription,
    /// Local subscription record matched by customer id.
    StoredCustomer,
}

impl ResolutionSource {
    /// Stable label for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::EventMetadata => "event_metadata",
            ResolutionSource::SubscriptionMetadata => "subscription_metadata",
            ResolutionSource::CustomerMetadata => "customer_metadata",
            ResolutionSource::CustomerEmail => "customer_email",
            ResolutionSource::EventEmail => "event_email",
            ResolutionSource::StoredSubscription => "stored_subscription",
            ResolutionSource::StoredCustomer => "stored_customer",
        }
    }

    /// Whether the account id should be written back onto the customer
    /// record so the next event resolves from metadata.
    pub fn wants_backfill(&self) -> bool {
        matches!(
            self,
            ResolutionSource::CustomerEmail
                | ResolutionSource::EventEmail
                | ResolutionSource::StoredSubscription
                | ResolutionSource::StoredCustomer
        )
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub account_id: AccountId,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn new(account_id: AccountId, source: ResolutionSource) -> Self {
        Self { account_id, source }
    }
}

/// What an event says about its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Account id from the primary object's own metadata.
    pub event_account_id: Option<AccountId>,
    /// Account id from the referenced subscription's metadata.
    pub subscription_account_id: Option<AccountId>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Email carried on the event itself (checkout, invoice).
    pub email: Option<CustomerEmail>,
}

impl ResolutionContext {
    /// Context for a completed checkout.
    pub fn from_checkout(session: &CheckoutSession) -> Self {
        Self {
            event_account_id: session.account_id(),
            subscription_account_id: None,
            customer_id: session.customer.clone(),
            subscription_id: session.subscription.clone(),
            email: session.email(),
        }
    }

    /// Context for a subscription event. The subscription is the primary
    /// object, so its metadata counts for both of the first two steps.
    pub fn from_subscription(subscription: &SubscriptionObject) -> Self {
        let account_id = subscription.account_id();
        Self {
            event_account_id: account_id,
            subscription_account_id: account_id,
            customer_id: Some(subscription.customer.clone()),
            subscription_id: Some(subscription.id.clone()),
            email: None,
        }
    }

    /// Context for an invoice event.
    pub fn from_invoice(invoice: &InvoiceObject) -> Self {
        Self {
            event_account_id: invoice.account_id(),
            subscription_account_id: invoice.subscription_account_id(),
            customer_id: invoice.customer.clone(),
            subscription_id: invoice.subscription.clone(),
            email: invoice
                .customer_email
                .as_deref()
                .and_then(|email| CustomerEmail::new(email).ok()),
        }
    }
}

/// Step 1: account id embedded on the event's primary object.
pub fn from_event_metadata(ctx: &ResolutionContext) -> Option<Resolution> {
    ctx.event_account_id
        .map(|id| Resolution::new(id, ResolutionSource::EventMetadata))
}

/// Step 2: account id on the referenced subscription's metadata.
pub fn from_subscription_metadata(ctx: &ResolutionContext) -> Option<Resolution> {
    ctx.subscription_account_id
        .map(|id| Resolution::new(id, ResolutionSource::SubscriptionMetadata))
}

/// Step 3a: account id on a fetched customer record.
pub fn from_customer_metadata(metadata: &Metadata) -> Option<Resolution> {
    account_id_from(metadata).map(|id| Resolution::new(id, ResolutionSource::CustomerMetadata))
}

/// Runs the steps that need no I/O, in priority order.
pub fn resolve_locally(ctx: &ResolutionContext) -> Option<Resolution> {
    from_event_metadata(ctx).or_else(|| from_subscription_metadata(ctx))
}
