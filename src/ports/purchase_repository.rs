//! PurchaseRepository port - append-only storage for one-time purchases.

use async_trait::async_trait;

use crate::domain::billing::PurchaseRecord;
use crate::domain::foundation::DomainError;

/// Result of attempting to insert a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row was written.
    Inserted,
    /// A row with the same checkout reference and item id already exists.
    Duplicate,
}

/// Port for purchase persistence.
///
/// Implementations enforce uniqueness on `(checkout_reference, item_id)`
/// (a UNIQUE constraint in SQL) so concurrent redeliveries cannot double
/// insert.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Insert the purchase unless its idempotency key already exists.
    ///
    /// An existing row is never modified.
    async fn insert_if_absent(&self, record: &PurchaseRecord) -> Result<InsertOutcome, DomainError>;

    /// All purchases recorded for a checkout, in insertion order.
    async fn find_by_checkout(
        &self,
        checkout_reference: &str,
    ) -> Result<Vec<PurchaseRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PurchaseRepository) {}
    }
}
