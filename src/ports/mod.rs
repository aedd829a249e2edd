//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Processor Ports
//!
//! - `PaymentProcessor` - Customer and subscription lookups, customer tagging
//!
//! ## Store Ports
//!
//! - `AccountDirectory` - Read-only email to account lookup
//! - `SubscriptionRepository` - One subscription record per account
//! - `PurchaseRepository` - Idempotent one-time purchase rows
//! - `DeliveryLog` - Ledger of verified deliveries and their outcomes

mod account_directory;
mod delivery_log;
mod payment_processor;
mod purchase_repository;
mod subscription_repository;

pub use account_directory::AccountDirectory;
pub use delivery_log::{DeliveryLog, DeliveryOutcome, DeliveryRecord};
pub use payment_processor::{
    PaymentProcessor, ProcessorCustomer, ProcessorError, ProcessorErrorCode, ProcessorSubscription,
};
pub use purchase_repository::{InsertOutcome, PurchaseRepository};
pub use subscription_repository::SubscriptionRepository;
