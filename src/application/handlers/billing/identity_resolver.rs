//! IdentityResolver - maps an event to the account it belongs to.
//!
//! Resolution runs an explicit ordered chain of steps and stops at the first
//! step that produces an account id. A step that fails (processor timeout,
//! store error) is logged and the chain moves on; the failure is only
//! reported when no later step resolves the account.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::billing::{
    from_customer_metadata, from_event_metadata, from_subscription_metadata, Resolution,
    ResolutionContext, ResolutionSource, WebhookError,
};
use crate::domain::foundation::CustomerEmail;
use crate::ports::{AccountDirectory, PaymentProcessor, SubscriptionRepository};

/// One step of the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStep {
    /// `metadata.account_id` on the primary object.
    EventMetadata,
    /// Metadata on the referenced subscription.
    SubscriptionMetadata,
    /// Live customer lookup: its metadata, else its email.
    LiveCustomer,
    /// Email carried on the event, matched against the account store.
    EventEmail,
    /// Local record holding the event's subscription id.
    StoredSubscription,
    /// Local record holding the event's customer id.
    StoredCustomer,
}

impl ResolverStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverStep::EventMetadata => "event_metadata",
            ResolverStep::SubscriptionMetadata => "subscription_metadata",
            ResolverStep::LiveCustomer => "live_customer",
            ResolverStep::EventEmail => "event_email",
            ResolverStep::StoredSubscription => "stored_subscription",
            ResolverStep::StoredCustomer => "stored_customer",
        }
    }
}

/// Chain used for subscription lifecycle events.
pub const SUBSCRIPTION_CHAIN: &[ResolverStep] = &[
    ResolverStep::EventMetadata,
    ResolverStep::SubscriptionMetadata,
    ResolverStep::LiveCustomer,
    ResolverStep::EventEmail,
    ResolverStep::StoredSubscription,
    ResolverStep::StoredCustomer,
];

/// Chain used for one-time purchases. Anything it cannot resolve is a guest.
pub const PURCHASE_CHAIN: &[ResolverStep] = &[ResolverStep::EventMetadata, ResolverStep::EventEmail];

/// Resolves accounts for billing events.
pub struct IdentityResolver {
    processor: Arc<dyn PaymentProcessor>,
    accounts: Arc<dyn AccountDirectory>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl IdentityResolver {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        accounts: Arc<dyn AccountDirectory>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            processor,
            accounts,
            subscriptions,
        }
    }

    /// Runs `chain` against the context.
    ///
    /// # Errors
    ///
    /// - `UnresolvedIdentity` - every step ran and none matched
    /// - `Processor` / `Database` - nothing matched and at least one step
    ///   failed; the first failure is returned
    pub async fn resolve(
        &self,
        ctx: &ResolutionContext,
        chain: &[ResolverStep],
    ) -> Result<Resolution, WebhookError> {
        let mut first_failure: Option<WebhookError> = None;

        for step in chain {
            match self.run_step(*step, ctx).await {
                Ok(Some(resolution)) => {
                    debug!(
                        account_id = %resolution.account_id,
                        source = %resolution.source,
                        "Resolved account for event"
                    );
                    self.backfill(ctx, &resolution).await;
                    return Ok(resolution);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        step = step.as_str(),
                        customer_id = ctx.customer_id.as_deref().unwrap_or("-"),
                        error = %err,
                        "Identity resolution step failed, trying next step"
                    );
                    first_failure.get_or_insert(err);
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| {
            WebhookError::UnresolvedIdentity(format!(
                "no account for customer {} / subscription {}",
                ctx.customer_id.as_deref().unwrap_or("-"),
                ctx.subscription_id.as_deref().unwrap_or("-"),
            ))
        }))
    }

    async fn run_step(
        &self,
        step: ResolverStep,
        ctx: &ResolutionContext,
    ) -> Result<Option<Resolution>, WebhookError> {
        match step {
            ResolverStep::EventMetadata => Ok(from_event_metadata(ctx)),
            ResolverStep::SubscriptionMetadata => Ok(from_subscription_metadata(ctx)),
            ResolverStep::LiveCustomer => self.from_live_customer(ctx).await,
            ResolverStep::EventEmail => match &ctx.email {
                Some(email) => self.match_email(email, ResolutionSource::EventEmail).await,
                None => Ok(None),
            },
            ResolverStep::StoredSubscription => {
                let Some(subscription_id) = ctx.subscription_id.as_deref() else {
                    return Ok(None);
                };
                let record = self
                    .subscriptions
                    .find_by_external_subscription_id(subscription_id)
                    .await?;
                Ok(record.map(|r| Resolution::new(r.account_id, ResolutionSource::StoredSubscription)))
            }
            ResolverStep::StoredCustomer => {
                let Some(customer_id) = ctx.customer_id.as_deref() else {
                    return Ok(None);
                };
                let record = self
                    .subscriptions
                    .find_by_external_customer_id(customer_id)
                    .await?;
                Ok(record.map(|r| Resolution::new(r.account_id, ResolutionSource::StoredCustomer)))
            }
        }
    }

    async fn from_live_customer(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<Resolution>, WebhookError> {
        let Some(customer_id) = ctx.customer_id.as_deref() else {
            return Ok(None);
        };

        debug!(customer_id, "Looking up customer at processor");
        let Some(customer) = self.processor.get_customer(customer_id).await? else {
            return Ok(None);
        };

        if let Some(resolution) = from_customer_metadata(&customer.metadata) {
            return Ok(Some(resolution));
        }

        match customer.email.as_deref().map(CustomerEmail::new) {
            Some(Ok(email)) => self.match_email(&email, ResolutionSource::CustomerEmail).await,
            _ => Ok(None),
        }
    }

    async fn match_email(
        &self,
        email: &CustomerEmail,
        source: ResolutionSource,
    ) -> Result<Option<Resolution>, WebhookError> {
        let account_id = self.accounts.find_account_by_email(email).await?;
        Ok(account_id.map(|id| Resolution::new(id, source)))
    }

    /// Writes the account id onto the customer so the next event resolves
    /// from metadata. Failures are logged and ignored.
    async fn backfill(&self, ctx: &ResolutionContext, resolution: &Resolution) {
        if !resolution.source.wants_backfill() {
            return;
        }
        let Some(customer_id) = ctx.customer_id.as_deref() else {
            return;
        };

        match self
            .processor
            .tag_customer_account(customer_id, resolution.account_id)
            .await
        {
            Ok(()) => info!(
                customer_id,
                account_id = %resolution.account_id,
                "Tagged customer with account id"
            ),
            Err(err) => warn!(
                customer_id,
                account_id = %resolution.account_id,
                transient = err.is_transient(),
                error = %err,
                "Failed to tag customer with account id"
            ),
        }
    }
}
