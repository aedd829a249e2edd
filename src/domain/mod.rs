//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `billing` - Subscription and purchase reconciliation rules

pub mod billing;
pub mod foundation;
