//! RecordPurchaseHandler - records one-time checkouts.
//!
//! A cart becomes one purchase row per item. Rows are keyed by
//! `(checkout_reference, item_id)`, so redelivering the same checkout never
//! duplicates anything.

use std::sync::Arc;

use tracing::{debug, info};

use super::identity_resolver::{IdentityResolver, PURCHASE_CHAIN};
use crate::domain::billing::{
    CartCheckout, CheckoutSession, PurchaseOwner, ResolutionContext, WebhookError,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{InsertOutcome, PurchaseRepository};

/// Result of recording a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPurchaseResult {
    pub owner: PurchaseOwner,
    /// Rows written by this delivery.
    pub inserted: usize,
    /// Rows that already existed from an earlier delivery.
    pub duplicates: usize,
}

/// Handler for completed one-time checkouts.
pub struct RecordPurchaseHandler {
    resolver: Arc<IdentityResolver>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl RecordPurchaseHandler {
    pub fn new(resolver: Arc<IdentityResolver>, purchases: Arc<dyn PurchaseRepository>) -> Self {
        Self {
            resolver,
            purchases,
        }
    }

    /// Records every item of the checkout.
    ///
    /// The purchase goes to the resolved account when there is one, else to
    /// the checkout email as a guest purchase.
    ///
    /// # Errors
    ///
    /// - `MissingField` - no item ids or no amount on the session
    /// - `UnresolvedIdentity` - neither an account nor an email is known
    /// - `Database` - a row could not be written; rows already written stay
    ///   and a redelivery fills in the rest
    pub async fn handle(
        &self,
        session: &CheckoutSession,
        completed_at: Timestamp,
    ) -> Result<RecordPurchaseResult, WebhookError> {
        let items = session.cart_items();
        if items.is_empty() {
            return Err(WebhookError::MissingField("metadata.item_ids"));
        }
        let total_cents = session
            .amount_total
            .ok_or(WebhookError::MissingField("amount_total"))?;

        let owner = self.owner_for(session).await?;

        let cart = CartCheckout {
            checkout_reference: session.id.clone(),
            payment_reference: session.payment_intent.clone(),
            items,
            total_cents,
            completed_at,
        };

        let mut inserted = 0;
        let mut duplicates = 0;
        for record in cart.into_records(owner.clone()) {
            match self.purchases.insert_if_absent(&record).await? {
                InsertOutcome::Inserted => inserted += 1,
                InsertOutcome::Duplicate => {
                    debug!(
                        checkout_reference = %record.checkout_reference,
                        item_id = %record.item_id,
                        "Purchase already recorded"
                    );
                    duplicates += 1;
                }
            }
        }

        info!(
            checkout_reference = %session.id,
            guest = matches!(owner, PurchaseOwner::Guest(_)),
            inserted,
            duplicates,
            "Purchase recorded"
        );

        Ok(RecordPurchaseResult {
            owner,
            inserted,
            duplicates,
        })
    }

    async fn owner_for(&self, session: &CheckoutSession) -> Result<PurchaseOwner, WebhookError> {
        let ctx = ResolutionContext::from_checkout(session);

        match self.resolver.resolve(&ctx, PURCHASE_CHAIN).await {
            Ok(resolution) => Ok(PurchaseOwner::Account(resolution.account_id)),
            Err(WebhookError::UnresolvedIdentity(reason)) => match ctx.email {
                Some(email) => Ok(PurchaseOwner::Guest(email)),
                None => Err(WebhookError::UnresolvedIdentity(format!(
                    "checkout {} has no account and no email: {}",
                    session.id, reason
                ))),
            },
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAccountDirectory, InMemoryPurchaseRepository, InMemorySubscriptionRepository,
    };
    use crate::adapters::stripe::MockPaymentProcessor;
    use crate::domain::foundation::{AccountId, CustomerEmail};
    use serde_json::json;

    struct Fixture {
        accounts: InMemoryAccountDirectory,
        purchases: InMemoryPurchaseRepository,
        handler: RecordPurchaseHandler,
    }

    fn fixture() -> Fixture {
        let accounts = InMemoryAccountDirectory::new();
        let purchases = InMemoryPurchaseRepository::new();
        let resolver = Arc::new(IdentityResolver::new(
            Arc::new(MockPaymentProcessor::new()),
            Arc::new(accounts.clone()),
            Arc::new(InMemorySubscriptionRepository::new()),
        ));
        Fixture {
            accounts,
            purchases: purchases.clone(),
            handler: RecordPurchaseHandler::new(resolver, Arc::new(purchases)),
        }
    }

    fn session(metadata: serde_json::Value, email: Option<&str>) -> CheckoutSession {
        serde_json::from_value(json!({
            "id": "cs_cart",
            "mode": "payment",
            "payment_intent": "pi_1",
            "amount_total": 3000,
            "customer_email": email,
            "metadata": metadata
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn cart_splits_into_one_row_per_item() {
        let f = fixture();
        let account_id = AccountId::new();
        let checkout = session(
            json!({"account_id": account_id.to_string(), "item_ids": "itn_a,itn_b,itn_c"}),
            None,
        );

        let result = f.handler.handle(&checkout, Timestamp::now()).await.unwrap();

        assert_eq!(result.owner, PurchaseOwner::Account(account_id));
        assert_eq!(result.inserted, 3);
        let rows = f.purchases.all().await;
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.amount_cents == 1000));
        assert!(rows.iter().all(|r| r.payment_reference.as_deref() == Some("pi_1")));
    }

    #[tokio::test]
    async fn repeated_item_ids_keep_the_full_total() {
        let f = fixture();
        let checkout = session(json!({"item_ids": "itn_a,itn_a"}), Some("g@example.com"));

        let result = f.handler.handle(&checkout, Timestamp::now()).await.unwrap();

        assert_eq!(result.inserted, 1);
        assert_eq!(result.duplicates, 0);
        let rows = f.purchases.all().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_cents, 3000);
    }

    #[tokio::test]
    async fn redelivery_inserts_nothing_new() {
        let f = fixture();
        let checkout = session(json!({"item_ids": "itn_a,itn_b,itn_c"}), Some("g@example.com"));

        f.handler.handle(&checkout, Timestamp::now()).await.unwrap();
        let second = f.handler.handle(&checkout, Timestamp::now()).await.unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(f.purchases.count().await, 3);
    }

    #[tokio::test]
    async fn unknown_email_becomes_guest_purchase() {
        let f = fixture();
        let checkout = session(json!({"item_id": "itn_a"}), Some("Guest@Example.com"));

        let result = f.handler.handle(&checkout, Timestamp::now()).await.unwrap();

        assert_eq!(
            result.owner,
            PurchaseOwner::Guest(CustomerEmail::new("guest@example.com").unwrap())
        );
        let rows = f.purchases.all().await;
        assert!(rows[0].account_id().is_none());
        assert_eq!(rows[0].amount_cents, 3000);
    }

    #[tokio::test]
    async fn known_email_links_purchase_to_account() {
        let f = fixture();
        let account_id = AccountId::new();
        f.accounts
            .register(CustomerEmail::new("member@example.com").unwrap(), account_id)
            .await;
        let checkout = session(json!({"item_id": "itn_a"}), Some("member@example.com"));

        let result = f.handler.handle(&checkout, Timestamp::now()).await.unwrap();

        assert_eq!(result.owner, PurchaseOwner::Account(account_id));
    }

    #[tokio::test]
    async fn missing_items_is_a_payload_error() {
        let f = fixture();
        let checkout = session(json!({}), Some("g@example.com"));

        let result = f.handler.handle(&checkout, Timestamp::now()).await;

        assert!(matches!(result, Err(WebhookError::MissingField(_))));
        assert_eq!(f.purchases.count().await, 0);
    }

    #[tokio::test]
    async fn no_account_and_no_email_is_unresolved() {
        let f = fixture();
        let checkout = session(json!({"item_id": "itn_a"}), None);

        let result = f.handler.handle(&checkout, Timestamp::now()).await;

        assert!(matches!(result, Err(WebhookError::UnresolvedIdentity(_))));
    }
}
