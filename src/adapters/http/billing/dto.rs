//! HTTP DTOs for billing endpoints.
//!
//! The processor only looks at the status code; the bodies are for operators
//! replaying deliveries by hand.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::HandleBillingWebhookResult;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement for a verified delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    /// Always true; present so the body is self-describing.
    pub received: bool,
    /// Stripe event ID.
    pub event_id: String,
    /// Stripe event type.
    pub event_type: String,
    /// processed, ignored, failed or unresolved.
    pub outcome: String,
    /// Why the event was not processed, if it wasn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<HandleBillingWebhookResult> for WebhookAckResponse {
    fn from(result: HandleBillingWebhookResult) -> Self {
        Self {
            received: true,
            event_id: result.event_id,
            event_type: result.event_type,
            outcome: result.report.outcome.as_str().to_string(),
            detail: result.report.detail,
        }
    }
}

/// Health probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::DispatchReport;
    use serde_json::json;

    #[test]
    fn ack_response_omits_detail_when_processed() {
        let response = WebhookAckResponse {
            received: true,
            event_id: "evt_1".to_string(),
            event_type: "invoice.paid".to_string(),
            outcome: "processed".to_string(),
            detail: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "received": true,
                "event_id": "evt_1",
                "event_type": "invoice.paid",
                "outcome": "processed"
            })
        );
    }

    #[test]
    fn ack_response_carries_ignore_reason() {
        let result = HandleBillingWebhookResult {
            event_id: "evt_2".to_string(),
            event_type: "customer.created".to_string(),
            report: DispatchReport::ignored("test mode event"),
        };

        let response = WebhookAckResponse::from(result);

        assert!(response.received);
        assert_eq!(response.outcome, "ignored");
        assert_eq!(response.detail.as_deref(), Some("test mode event"));
    }

    #[test]
    fn health_response_serializes() {
        let value = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }
}
