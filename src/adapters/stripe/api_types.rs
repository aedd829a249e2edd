//! Shapes of the Stripe REST responses the adapter reads.
//!
//! `GET /v1/subscriptions/{id}` returns the same object webhooks carry, so
//! the domain payload type is reused for it.

use serde::Deserialize;

use crate::domain::billing::{null_as_default, Metadata, SubscriptionObject};
use crate::ports::{ProcessorCustomer, ProcessorSubscription};

/// `GET /v1/customers/{id}`; deleted customers come back as a stub.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,

    #[serde(default)]
    pub deleted: bool,
}

pub type StripeSubscription = SubscriptionObject;

impl From<StripeCustomer> for ProcessorCustomer {
    fn from(customer: StripeCustomer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            metadata: customer.metadata,
        }
    }
}

impl From<StripeSubscription> for ProcessorSubscription {
    fn from(subscription: StripeSubscription) -> Self {
        Self {
            price_id: subscription.price_id().map(str::to_string),
            id: subscription.id,
            customer_id: subscription.customer,
            status: subscription.status,
            current_period_end: subscription.current_period_end,
            metadata: subscription.metadata,
        }
    }
}

/// `{"error": {...}}` envelope on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Machine code such as `resource_missing`.
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deleted_customer_stub_parses() {
        let customer: StripeCustomer = serde_json::from_value(json!({
            "id": "cus_gone",
            "object": "customer",
            "deleted": true,
            "metadata": null
        }))
        .unwrap();

        assert!(customer.deleted);
        assert!(customer.email.is_none());
        assert!(customer.metadata.is_empty());
    }

    #[test]
    fn subscription_response_converts_with_first_price() {
        let subscription: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_9",
            "object": "subscription",
            "customer": "cus_9",
            "status": "past_due",
            "current_period_end": 1_900_000_000,
            "metadata": {"account_id": "not-checked-here"},
            "items": {"object": "list", "data": [
                {"id": "si_1", "price": {"id": "price_premium"}},
                {"id": "si_2", "price": {"id": "price_addon"}}
            ]}
        }))
        .unwrap();

        let converted = ProcessorSubscription::from(subscription);

        assert_eq!(converted.price_id.as_deref(), Some("price_premium"));
        assert_eq!(converted.customer_id, "cus_9");
        assert_eq!(converted.status, "past_due");
        assert_eq!(converted.current_period_end, Some(1_900_000_000));
        assert_eq!(converted.metadata.len(), 1);
    }

    #[test]
    fn error_envelope_keeps_code_and_message() {
        let body: StripeErrorBody = serde_json::from_value(json!({
            "error": {
                "type": "invalid_request_error",
                "code": "resource_missing",
                "message": "No such customer: 'cus_x'"
            }
        }))
        .unwrap();

        assert_eq!(body.error.code.as_deref(), Some("resource_missing"));
        assert!(body.error.message.unwrap().contains("cus_x"));
    }
}
