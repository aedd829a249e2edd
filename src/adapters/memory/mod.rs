//! In-memory store adapters.
//!
//! Implement every store port without a database. Used by tests and by
//! local runs with no database configured.

mod account_directory;
mod delivery_log;
mod purchase_repository;
mod subscription_repository;

pub use account_directory::InMemoryAccountDirectory;
pub use delivery_log::InMemoryDeliveryLog;
pub use purchase_repository::InMemoryPurchaseRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
