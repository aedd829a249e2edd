//! One-time purchase records.
//!
//! A purchase belongs either to an account or to a guest email, never both.
//! Records are written once per `(checkout_reference, item_id)` and never
//! updated afterwards.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, CustomerEmail, PurchaseId, Timestamp};

/// Who a purchase belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PurchaseOwner {
    /// Purchase linked to a known account.
    Account(AccountId),
    /// Guest purchase tracked by email only.
    Guest(CustomerEmail),
}

/// A completed one-time purchase of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub owner: PurchaseOwner,
    pub item_id: String,
    /// Processor payment reference (payment intent id).
    pub payment_reference: Option<String>,
    /// Processor checkout session id.
    pub checkout_reference: String,
    pub amount_cents: i64,
    pub purchased_at: Timestamp,
}

impl PurchaseRecord {
    /// Account the purchase belongs to, if any.
    pub fn account_id(&self) -> Option<AccountId> {
        match &self.owner {
            PurchaseOwner::Account(id) => Some(*id),
            PurchaseOwner::Guest(_) => None,
        }
    }

    /// Guest email, populated only for guest purchases.
    pub fn customer_email(&self) -> Option<&CustomerEmail> {
        match &self.owner {
            PurchaseOwner::Account(_) => None,
            PurchaseOwner::Guest(email) => Some(email),
        }
    }

    /// Idempotency key: one row per item per checkout.
    pub fn idempotency_key(&self) -> (&str, &str) {
        (&self.checkout_reference, &self.item_id)
    }
}

/// Completed one-time checkout, ready to be split into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartCheckout {
    pub checkout_reference: String,
    pub payment_reference: Option<String>,
    /// Item ids in cart order.
    pub items: Vec<String>,
    pub total_cents: i64,
    pub completed_at: Timestamp,
}

impl CartCheckout {
    /// Splits the cart into one record per item for the given owner.
    ///
    /// Each record carries `total / count` cents (integer division), so the
    /// sum may fall short of the total by less than `count` cents.
    pub fn into_records(self, owner: PurchaseOwner) -> Vec<PurchaseRecord> {
        let per_item = split_amount(self.total_cents, self.items.len());

        self.items
            .into_iter()
            .map(|item_id| PurchaseRecord {
                id: PurchaseId::new(),
                owner: owner.clone(),
                item_id,
                payment_reference: self.payment_reference.clone(),
                checkout_reference: self.checkout_reference.clone(),
                amount_cents: per_item,
                purchased_at: self.completed_at,
            })
            .collect()
    }
}

/// Per-item share of a cart total. An empty cart yields zero.
pub fn split_amount(total_cents: i64, item_count: usize) -> i64 {
    match i64::try_from(item_count) {
        Ok(count) if count > 0 => total_cents / count,
        _ => 0,
    }
}
