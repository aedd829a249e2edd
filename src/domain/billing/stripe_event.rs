//! Stripe event envelope and the closed set of billing events.
//!
//! The envelope is parsed during verification. [`BillingEvent::from_event`]
//! then decodes the data object into the payload struct for its type;
//! anything we do not handle becomes [`BillingEvent::Unhandled`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::payloads::{CheckoutSession, InvoiceObject, SubscriptionObject};
use super::webhook_errors::WebhookError;
use crate::domain::foundation::Timestamp;

/// Event envelope as delivered to the webhook endpoint.
///
/// The same `id` may arrive more than once.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// evt_...
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds.
    pub created: i64,

    pub data: StripeEventData,

    /// False for events generated with test-mode keys.
    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

/// `data` member of the envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// Shape depends on the event type.
    pub object: serde_json::Value,
}

impl StripeEvent {
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// When the processor says the event happened.
    pub fn occurred_at(&self) -> Option<Timestamp> {
        Timestamp::from_unix_secs(self.created)
    }

    /// `None` for event types reconciliation does not act on.
    pub fn parsed_type(&self) -> Option<StripeEventType> {
        StripeEventType::parse(&self.event_type)
    }

    fn decode<T: DeserializeOwned>(&self, kind: StripeEventType) -> Result<T, WebhookError> {
        T::deserialize(&self.data.object).map_err(|e| WebhookError::InvalidPayload {
            event_type: kind.as_str(),
            reason: e.to_string(),
        })
    }
}

/// Event types reconciliation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    CustomerSubscriptionUpdated,
    CustomerSubscriptionDeleted,
    /// `invoice.paid`, or the older `invoice.payment_succeeded`.
    InvoicePaid,
    InvoicePaymentFailed,
}

impl StripeEventType {
    pub fn parse(event_type: &str) -> Option<Self> {
        let kind = match event_type {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::CustomerSubscriptionUpdated,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            "invoice.paid" | "invoice.payment_succeeded" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CustomerSubscriptionUpdated => "customer.subscription.updated",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
        }
    }
}

/// A verified event, decoded into the payload its type promises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    CheckoutCompleted(CheckoutSession),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    InvoicePaid(InvoiceObject),
    InvoicePaymentFailed(InvoiceObject),
    /// Carries the raw type string.
    Unhandled(String),
}

impl BillingEvent {
    /// Decodes the envelope's data object according to its type.
    ///
    /// # Errors
    ///
    /// `WebhookError::InvalidPayload` when a handled type carries an object
    /// that does not match its payload struct. Unhandled types never fail.
    pub fn from_event(event: &StripeEvent) -> Result<Self, WebhookError> {
        let Some(kind) = event.parsed_type() else {
            return Ok(BillingEvent::Unhandled(event.event_type.clone()));
        };

        Ok(match kind {
            StripeEventType::CheckoutSessionCompleted => {
                BillingEvent::CheckoutCompleted(event.decode(kind)?)
            }
            StripeEventType::CustomerSubscriptionUpdated => {
                BillingEvent::SubscriptionUpdated(event.decode(kind)?)
            }
            StripeEventType::CustomerSubscriptionDeleted => {
                BillingEvent::SubscriptionDeleted(event.decode(kind)?)
            }
            StripeEventType::InvoicePaid => BillingEvent::InvoicePaid(event.decode(kind)?),
            StripeEventType::InvoicePaymentFailed => {
                BillingEvent::InvoicePaymentFailed(event.decode(kind)?)
            }
        })
    }
}

/// Test helper producing envelopes with sensible defaults.
#[cfg(test)]
pub struct StripeEventBuilder(StripeEvent);

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self(StripeEvent {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            data: StripeEventData {
                object: serde_json::json!({}),
            },
            livemode: false,
            api_version: Some("2023-10-16".to_string()),
        })
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.0.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.0.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.0.data.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.0.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        self.0
    }
}
