//! Subscription record and the lifecycle transitions applied to it.
//!
//! One record exists per account. Records are never deleted: a cancellation
//! is a transition to `canceled` on the `free` plan.
//!
//! # Transition table
//!
//! | Event                         | Plan                 | Status                   |
//! |-------------------------------|----------------------|--------------------------|
//! | checkout completed (sub mode) | from price           | active                   |
//! | subscription updated          | from price           | processor-reported       |
//! | subscription deleted          | free                 | canceled                 |
//! | invoice payment succeeded     | from price           | active                   |
//! | invoice payment failed        | unchanged            | past_due                 |
//!
//! Changes are applied last-write-wins per field. No event ordering check is
//! made, so a late older event can overwrite a newer one.

use serde::{Deserialize, Serialize};

use super::plan::PlanTier;
use super::status::SubscriptionStatus;
use crate::domain::foundation::{AccountId, Timestamp};

/// Locally held view of an account's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub account_id: AccountId,
    pub external_customer_id: Option<String>,
    pub external_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan: PlanTier,
    pub created_at: Timestamp,
    /// End of the current billing period, as last reported.
    pub ends_at: Option<Timestamp>,
}

/// Field set written by one lifecycle event.
///
/// `None` means "leave the stored value alone". `status` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub external_customer_id: Option<String>,
    pub external_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan: Option<PlanTier>,
    pub ends_at: Option<Timestamp>,
}

impl SubscriptionChange {
    /// Checkout completed in subscription mode.
    pub fn checkout_completed(
        customer_id: Option<String>,
        subscription_id: Option<String>,
        plan: PlanTier,
    ) -> Self {
        Self {
            external_customer_id: customer_id,
            external_subscription_id: subscription_id,
            status: SubscriptionStatus::Active,
            plan: Some(plan),
            ends_at: None,
        }
    }

    /// Subscription updated: mirror whatever the processor reports.
    pub fn subscription_updated(
        customer_id: Option<String>,
        subscription_id: Option<String>,
        reported_status: SubscriptionStatus,
        plan: PlanTier,
        ends_at: Option<Timestamp>,
    ) -> Self {
        Self {
            external_customer_id: customer_id,
            external_subscription_id: subscription_id,
            status: reported_status,
            plan: Some(plan),
            ends_at,
        }
    }

    /// Subscription deleted: downgrade to free regardless of prior plan.
    pub fn subscription_deleted(
        customer_id: Option<String>,
        subscription_id: Option<String>,
    ) -> Self {
        Self {
            external_customer_id: customer_id,
            external_subscription_id: subscription_id,
            status: SubscriptionStatus::Canceled,
            plan: Some(PlanTier::Free),
            ends_at: None,
        }
    }

    /// Invoice paid: renewal confirmation.
    pub fn payment_succeeded(
        customer_id: Option<String>,
        subscription_id: Option<String>,
        plan: PlanTier,
    ) -> Self {
        Self {
            external_customer_id: customer_id,
            external_subscription_id: subscription_id,
            status: SubscriptionStatus::Active,
            plan: Some(plan),
            ends_at: None,
        }
    }

    /// Invoice payment failed: past due, plan untouched.
    pub fn payment_failed(customer_id: Option<String>, subscription_id: Option<String>) -> Self {
        Self {
            external_customer_id: customer_id,
            external_subscription_id: subscription_id,
            status: SubscriptionStatus::PastDue,
            plan: None,
            ends_at: None,
        }
    }
}

impl SubscriptionRecord {
    /// Builds the first record for an account from a change.
    ///
    /// A change without a plan (payment failed before any checkout was seen)
    /// starts the account on the free plan.
    pub fn create(account_id: AccountId, change: SubscriptionChange, now: Timestamp) -> Self {
        Self {
            account_id,
            external_customer_id: change.external_customer_id,
            external_subscription_id: change.external_subscription_id,
            status: change.status,
            plan: change.plan.unwrap_or(PlanTier::Free),
            created_at: now,
            ends_at: change.ends_at,
        }
    }

    /// Applies a change in place, last-write-wins per field.
    pub fn apply(&mut self, change: SubscriptionChange) {
        if let Some(customer_id) = change.external_customer_id {
            self.external_customer_id = Some(customer_id);
        }
        if let Some(subscription_id) = change.external_subscription_id {
            self.external_subscription_id = Some(subscription_id);
        }
        self.status = change.status;
        if let Some(plan) = change.plan {
            self.plan = plan;
        }
        if let Some(ends_at) = change.ends_at {
            self.ends_at = Some(ends_at);
        }
    }

    /// Insert-or-update against an optional existing record.
    ///
    /// This is the reference semantics every `SubscriptionRepository`
    /// implementation must reproduce.
    pub fn upsert(
        existing: Option<SubscriptionRecord>,
        account_id: AccountId,
        change: SubscriptionChange,
        now: Timestamp,
    ) -> Self {
        match existing {
            Some(mut record) => {
                record.apply(change);
                record
            }
            None => Self::create(account_id, change, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_premium(account_id: AccountId) -> SubscriptionRecord {
        SubscriptionRecord::create(
            account_id,
            SubscriptionChange::checkout_completed(
                Some("cus_1".to_string()),
                Some("sub_1".to_string()),
                PlanTier::Premium,
            ),
            Timestamp::now(),
        )
    }

    #[test]
    fn checkout_creates_active_record() {
        let account_id = AccountId::new();
        let record = active_premium(account_id);

        assert_eq!(record.account_id, account_id);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan, PlanTier::Premium);
        assert_eq!(record.external_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(record.external_subscription_id.as_deref(), Some("sub_1"));
    }

    #[test]
    fn deleted_forces_free_and_canceled_from_any_plan() {
        for plan in [PlanTier::Free, PlanTier::Standard, PlanTier::Premium] {
            let mut record = active_premium(AccountId::new());
            record.plan = plan;

            record.apply(SubscriptionChange::subscription_deleted(None, None));

            assert_eq!(record.status, SubscriptionStatus::Canceled);
            assert_eq!(record.plan, PlanTier::Free);
        }
    }

    #[test]
    fn payment_failed_keeps_plan() {
        let mut record = active_premium(AccountId::new());

        record.apply(SubscriptionChange::payment_failed(None, Some("sub_1".to_string())));

        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.plan, PlanTier::Premium);
    }

    #[test]
    fn payment_succeeded_reactivates_with_mapped_plan() {
        let mut record = active_premium(AccountId::new());
        record.apply(SubscriptionChange::payment_failed(None, None));

        record.apply(SubscriptionChange::payment_succeeded(None, None, PlanTier::Standard));

        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan, PlanTier::Standard);
    }

    #[test]
    fn update_mirrors_processor_status_and_stores_end_date() {
        let mut record = active_premium(AccountId::new());
        let ends_at = Timestamp::from_unix_secs(1_900_000_000).unwrap();

        record.apply(SubscriptionChange::subscription_updated(
            Some("cus_1".to_string()),
            Some("sub_1".to_string()),
            SubscriptionStatus::PastDue,
            PlanTier::Premium,
            Some(ends_at),
        ));

        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.ends_at, Some(ends_at));
    }

    #[test]
    fn absent_fields_are_left_untouched() {
        let mut record = active_premium(AccountId::new());
        let ends_at = Timestamp::from_unix_secs(1_900_000_000).unwrap();
        record.ends_at = Some(ends_at);

        record.apply(SubscriptionChange::payment_failed(None, None));

        assert_eq!(record.external_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(record.external_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(record.ends_at, Some(ends_at));
    }

    #[test]
    fn payment_failed_without_record_starts_on_free() {
        let record = SubscriptionRecord::create(
            AccountId::new(),
            SubscriptionChange::payment_failed(Some("cus_9".to_string()), None),
            Timestamp::now(),
        );

        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.plan, PlanTier::Free);
    }

    #[test]
    fn upsert_is_idempotent() {
        let account_id = AccountId::new();
        let now = Timestamp::now();
        let change = SubscriptionChange::subscription_updated(
            Some("cus_1".to_string()),
            Some("sub_1".to_string()),
            SubscriptionStatus::Active,
            PlanTier::Premium,
            Timestamp::from_unix_secs(1_900_000_000),
        );

        let once = SubscriptionRecord::upsert(None, account_id, change.clone(), now);
        let twice = SubscriptionRecord::upsert(Some(once.clone()), account_id, change, now);

        assert_eq!(once, twice);
    }

    #[test]
    fn upsert_keeps_original_created_at() {
        let account_id = AccountId::new();
        let created = Timestamp::from_unix_secs(1_700_000_000).unwrap();
        let later = Timestamp::from_unix_secs(1_800_000_000).unwrap();

        let record = SubscriptionRecord::upsert(
            None,
            account_id,
            SubscriptionChange::checkout_completed(None, None, PlanTier::Standard),
            created,
        );
        let record = SubscriptionRecord::upsert(
            Some(record),
            account_id,
            SubscriptionChange::subscription_deleted(None, None),
            later,
        );

        assert_eq!(record.created_at, created);
    }

    #[test]
    fn later_event_overwrites_earlier_regardless_of_order() {
        let mut record = active_premium(AccountId::new());

        // A stale "payment failed" arriving after a renewal still wins.
        record.apply(SubscriptionChange::payment_succeeded(None, None, PlanTier::Premium));
        record.apply(SubscriptionChange::payment_failed(None, None));

        assert_eq!(record.status, SubscriptionStatus::PastDue);
    }
}
