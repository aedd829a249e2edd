//! Itinerary Billing - billing event reconciliation
//!
//! Receives Stripe webhook deliveries, verifies them, and keeps each account's
//! subscription state and one-time purchases in line with the processor.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
