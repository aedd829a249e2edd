//! HTTP adapter for billing endpoints.
//!
//! - `POST /webhooks/billing` - Stripe webhook deliveries (signature verified)
//! - `GET /health` - load balancer probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{BillingApiError, BillingAppState};
pub use routes::{billing_router, billing_routes};
