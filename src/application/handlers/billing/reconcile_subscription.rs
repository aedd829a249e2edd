//! ReconcileSubscriptionHandler - applies subscription lifecycle events.

use std::sync::Arc;

use tracing::{info, warn};

use super::identity_resolver::{IdentityResolver, SUBSCRIPTION_CHAIN};
use crate::domain::billing::{
    CheckoutSession, InvoiceObject, PlanTier, PriceToPlanTable, ResolutionContext,
    ResolutionSource, SubscriptionChange, SubscriptionObject, SubscriptionStatus, WebhookError,
};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::{PaymentProcessor, SubscriptionRepository};

/// Result of applying one lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSubscriptionResult {
    pub account_id: AccountId,
    pub source: ResolutionSource,
    pub status: SubscriptionStatus,
    pub plan: PlanTier,
}

/// Handler for subscription lifecycle events.
pub struct ReconcileSubscriptionHandler {
    resolver: Arc<IdentityResolver>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    processor: Arc<dyn PaymentProcessor>,
    plans: Arc<PriceToPlanTable>,
}

impl ReconcileSubscriptionHandler {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        processor: Arc<dyn PaymentProcessor>,
        plans: Arc<PriceToPlanTable>,
    ) -> Self {
        Self {
            resolver,
            subscriptions,
            processor,
            plans,
        }
    }

    /// Checkout completed in subscription mode: active on the purchased plan.
    pub async fn checkout_completed(
        &self,
        session: &CheckoutSession,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        let plan = self.checkout_plan(session).await;
        let change = SubscriptionChange::checkout_completed(
            session.customer.clone(),
            session.subscription.clone(),
            plan,
        );
        self.apply(ResolutionContext::from_checkout(session), change)
            .await
    }

    /// Subscription updated: mirror the processor's status and period end.
    pub async fn subscription_updated(
        &self,
        subscription: &SubscriptionObject,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        let change = SubscriptionChange::subscription_updated(
            Some(subscription.customer.clone()),
            Some(subscription.id.clone()),
            subscription.local_status(),
            self.plans.plan_for(subscription.price_id()),
            subscription.ends_at(),
        );
        self.apply(ResolutionContext::from_subscription(subscription), change)
            .await
    }

    /// Subscription deleted: canceled on the free plan.
    pub async fn subscription_deleted(
        &self,
        subscription: &SubscriptionObject,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        let change = SubscriptionChange::subscription_deleted(
            Some(subscription.customer.clone()),
            Some(subscription.id.clone()),
        );
        self.apply(ResolutionContext::from_subscription(subscription), change)
            .await
    }

    /// Invoice paid: renewal, active on the invoiced plan.
    ///
    /// Invoices that belong to no subscription are one-off charges and are
    /// ignored.
    pub async fn invoice_paid(
        &self,
        invoice: &InvoiceObject,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        Self::require_subscription(invoice)?;
        let change = SubscriptionChange::payment_succeeded(
            invoice.customer.clone(),
            invoice.subscription.clone(),
            self.plans.plan_for(invoice.price_id()),
        );
        self.apply(ResolutionContext::from_invoice(invoice), change)
            .await
    }

    /// Invoice payment failed: past due, plan untouched.
    pub async fn invoice_failed(
        &self,
        invoice: &InvoiceObject,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        Self::require_subscription(invoice)?;
        let change =
            SubscriptionChange::payment_failed(invoice.customer.clone(), invoice.subscription.clone());
        self.apply(ResolutionContext::from_invoice(invoice), change)
            .await
    }

    async fn apply(
        &self,
        ctx: ResolutionContext,
        change: SubscriptionChange,
    ) -> Result<ReconcileSubscriptionResult, WebhookError> {
        let resolution = self.resolver.resolve(&ctx, SUBSCRIPTION_CHAIN).await?;

        let record = self
            .subscriptions
            .upsert(resolution.account_id, change, Timestamp::now())
            .await?;

        info!(
            account_id = %record.account_id,
            source = %resolution.source,
            status = record.status.as_str(),
            plan = record.plan.as_str(),
            "Subscription reconciled"
        );

        Ok(ReconcileSubscriptionResult {
            account_id: record.account_id,
            source: resolution.source,
            status: record.status,
            plan: record.plan,
        })
    }

    /// Plan for a subscription checkout.
    ///
    /// Session metadata first, then the subscription's price at the
    /// processor. A failed lookup falls back to the default plan so the
    /// status change still lands.
    async fn checkout_plan(&self, session: &CheckoutSession) -> PlanTier {
        if let Some(price_id) = session.price_id() {
            return self.plans.plan_for(Some(price_id));
        }

        let Some(subscription_id) = session.subscription.as_deref() else {
            return self.plans.default_plan();
        };

        match self.processor.get_subscription(subscription_id).await {
            Ok(Some(subscription)) => self.plans.plan_for(subscription.price_id.as_deref()),
            Ok(None) => self.plans.default_plan(),
            Err(err) => {
                warn!(
                    subscription_id,
                    transient = err.is_transient(),
                    error = %err,
                    "Subscription lookup failed, using default plan"
                );
                self.plans.default_plan()
            }
        }
    }

    fn require_subscription(invoice: &InvoiceObject) -> Result<(), WebhookError> {
        match invoice.subscription {
            Some(_) => Ok(()),
            None => Err(WebhookError::Ignored(format!(
                "invoice {} has no subscription",
                invoice.id
            ))),
        }
    }
}
