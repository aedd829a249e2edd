//! HTTP handlers for billing endpoints.
//!
//! The Outcome Reporter lives here: verified deliveries always get a 200,
//! verification failures a 400, a missing signing secret a 500.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler,
};
use crate::domain::billing::WebhookError;

use super::dto::{ErrorResponse, HealthResponse, WebhookAckResponse};

/// Header carrying the `t=...,v1=...` signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for billing routes.
///
/// Cloned per request; the handler is built once at start-up.
#[derive(Clone)]
pub struct BillingAppState {
    pub webhook_handler: Arc<HandleBillingWebhookHandler>,
}

impl BillingAppState {
    pub fn new(webhook_handler: HandleBillingWebhookHandler) -> Self {
        Self {
            webhook_handler: Arc::new(webhook_handler),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/billing - Handle a Stripe webhook delivery
///
/// The body is taken as raw bytes: the signature covers the exact payload,
/// so it must not be re-serialized before verification.
pub async fn handle_billing_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleBillingWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook_handler.handle(cmd).await?;

    Ok(Json(WebhookAckResponse::from(result)))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook rejections to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(WebhookError);

impl From<WebhookError> for BillingApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl BillingApiError {
    fn error_code(&self) -> &'static str {
        match &self.0 {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => {
                "INVALID_TIMESTAMP"
            }
            WebhookError::ParseError(_) => "INVALID_PAYLOAD",
            WebhookError::MissingSecret => "WEBHOOK_NOT_CONFIGURED",
            _ => "WEBHOOK_ERROR",
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        // Configuration details stay in the logs.
        let message = match &self.0 {
            WebhookError::MissingSecret => "Webhook endpoint is not configured".to_string(),
            err => err.to_string(),
        };
        let error = ErrorResponse::new(self.error_code(), message);
        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn invalid_signature_maps_to_bad_request() {
        let response = BillingApiError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn stale_timestamp_maps_to_bad_request() {
        let response = BillingApiError::from(WebhookError::TimestampOutOfRange).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_secret_maps_to_internal_error() {
        let response = BillingApiError::from(WebhookError::MissingSecret).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            BillingApiError(WebhookError::MissingSignature).error_code(),
            "MISSING_SIGNATURE"
        );
        assert_eq!(
            BillingApiError(WebhookError::ParseError("bad json".into())).error_code(),
            "INVALID_PAYLOAD"
        );
        assert_eq!(
            BillingApiError(WebhookError::MissingSecret).error_code(),
            "WEBHOOK_NOT_CONFIGURED"
        );
    }
}
