//! Typed payloads for the event types we handle.
//!
//! Each handled event type gets its own struct, parsed once at the boundary.
//! Only the fields reconciliation reads are captured; everything else in the
//! processor's object is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::{AccountId, CustomerEmail, Timestamp};

use super::status::SubscriptionStatus;

/// Metadata key carrying our account id on processor objects.
pub const ACCOUNT_ID_METADATA_KEY: &str = "account_id";

/// Metadata key carrying the price id on checkout sessions.
pub const PRICE_ID_METADATA_KEY: &str = "price_id";

/// Metadata key carrying a comma separated list of purchased item ids.
pub const ITEM_IDS_METADATA_KEY: &str = "item_ids";

/// Metadata key carrying a single purchased item id.
pub const ITEM_ID_METADATA_KEY: &str = "item_id";

/// Free-form string metadata attached to processor objects.
pub type Metadata = HashMap<String, String>;

/// Treats an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads our account id from a metadata map.
pub fn account_id_from(metadata: &Metadata) -> Option<AccountId> {
    metadata
        .get(ACCOUNT_ID_METADATA_KEY)
        .and_then(|value| AccountId::from_metadata(value))
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout Session
// ════════════════════════════════════════════════════════════════════════════════

/// Checkout session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Recurring subscription checkout.
    Subscription,
    /// One-time payment (cart purchase).
    Payment,
    /// Payment method setup only.
    Setup,
    /// Any mode we do not know about.
    #[serde(other)]
    Other,
}

/// Customer details collected during checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// Completed checkout session (`checkout.session.completed`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckoutSession {
    /// Session id (cs_...), used as the checkout reference.
    pub id: String,

    pub mode: CheckoutMode,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    /// Subscription created by the checkout, in subscription mode.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Payment reference, in payment mode.
    #[serde(default)]
    pub payment_intent: Option<String>,

    /// Total charged, in cents.
    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

impl CheckoutSession {
    /// Account id embedded by checkout creation, if any.
    pub fn account_id(&self) -> Option<AccountId> {
        account_id_from(&self.metadata)
    }

    /// Email the customer checked out with.
    ///
    /// Details collected on the checkout page win over the prefilled email.
    pub fn email(&self) -> Option<CustomerEmail> {
        self.customer_details
            .as_ref()
            .and_then(|details| details.email.as_deref())
            .or(self.customer_email.as_deref())
            .and_then(|email| CustomerEmail::new(email).ok())
    }

    /// Price id recorded on the session at creation time.
    pub fn price_id(&self) -> Option<&str> {
        self.metadata
            .get(PRICE_ID_METADATA_KEY)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Purchased item ids, in cart order.
    ///
    /// Reads `item_ids` (comma separated) and falls back to a single
    /// `item_id`. Blank entries are dropped and a repeated id counts once,
    /// since rows are keyed by checkout and item.
    pub fn cart_items(&self) -> Vec<String> {
        let raw = self
            .metadata
            .get(ITEM_IDS_METADATA_KEY)
            .or_else(|| self.metadata.get(ITEM_ID_METADATA_KEY));

        let mut items: Vec<String> = Vec::new();
        for item in raw.into_iter().flat_map(|list| list.split(',')) {
            let item = item.trim();
            if !item.is_empty() && !items.iter().any(|seen| seen == item) {
                items.push(item.to_string());
            }
        }
        items
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription
// ════════════════════════════════════════════════════════════════════════════════

/// Price reference embedded in subscription items and invoice lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriceRef {
    pub id: String,
}

/// Single subscription item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionItem {
    pub price: PriceRef,
}

/// Subscription items list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

/// Subscription object (`customer.subscription.updated` / `.deleted`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionObject {
    /// Subscription id (sub_...).
    pub id: String,

    /// Customer owning the subscription (cus_...).
    pub customer: String,

    /// Processor-reported status.
    pub status: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,

    #[serde(default, deserialize_with = "null_as_default")]
    pub items: SubscriptionItems,

    /// End of the current billing period (Unix seconds).
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionObject {
    /// Account id stored on the subscription's own metadata.
    pub fn account_id(&self) -> Option<AccountId> {
        account_id_from(&self.metadata)
    }

    /// Price of the first subscription item.
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }

    /// Processor status folded onto the local status set.
    pub fn local_status(&self) -> SubscriptionStatus {
        SubscriptionStatus::from_processor(&self.status)
    }

    /// Renewal end date, if reported.
    pub fn ends_at(&self) -> Option<Timestamp> {
        self.current_period_end.and_then(Timestamp::from_unix_secs)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoice
// ════════════════════════════════════════════════════════════════════════════════

/// Single invoice line item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvoiceLine {
    #[serde(default)]
    pub price: Option<PriceRef>,
}

/// Invoice lines list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvoiceLines {
    #[serde(default)]
    pub data: Vec<InvoiceLine>,
}

/// Snapshot of the subscription's metadata at invoice time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

/// Invoice object (`invoice.payment_succeeded` / `.payment_failed`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvoiceObject {
    /// Invoice id (in_...).
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,

    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: InvoiceLines,
}

impl InvoiceObject {
    /// Account id from the invoice metadata.
    pub fn account_id(&self) -> Option<AccountId> {
        account_id_from(&self.metadata)
    }

    /// Account id from the subscription metadata snapshot.
    pub fn subscription_account_id(&self) -> Option<AccountId> {
        self.subscription_details
            .as_ref()
            .and_then(|details| account_id_from(&details.metadata))
    }

    /// Price of the first priced line.
    pub fn price_id(&self) -> Option<&str> {
        self.lines
            .data
            .iter()
            .find_map(|line| line.price.as_ref())
            .map(|price| price.id.as_str())
    }
}
