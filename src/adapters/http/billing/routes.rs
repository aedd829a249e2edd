//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{handle_billing_webhook, health, BillingAppState};

/// Create the billing route table.
///
/// # Routes
/// - `POST /webhooks/billing` - Stripe webhook deliveries (no auth, signature verified)
/// - `GET /health` - liveness probe
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/webhooks/billing", post(handle_billing_webhook))
        .route("/health", get(health))
}

/// Create the billing router with its state attached.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(BillingAppState::new(webhook_handler))
///     .layer(TraceLayer::new_for_http());
/// ```
pub fn billing_router(state: BillingAppState) -> Router {
    billing_routes().with_state(state)
}
