//! BillingEventDispatcher - routes verified events to their handler.
//!
//! Every handler runs inside an absorb wrapper: errors and panics become a
//! [`DispatchReport`] with a failed outcome instead of propagating. A
//! delivery that passed verification is always acknowledged.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use super::reconcile_subscription::{ReconcileSubscriptionHandler, ReconcileSubscriptionResult};
use super::record_purchase::{RecordPurchaseHandler, RecordPurchaseResult};
use crate::domain::billing::{
    BillingEvent, CheckoutMode, ErrorCategory, PurchaseOwner, StripeEvent, WebhookError,
};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::ports::DeliveryOutcome;

/// What a handler did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandledEvent {
    Subscription(ReconcileSubscriptionResult),
    Purchase(RecordPurchaseResult),
}

/// Outcome of dispatching one event, as written to the delivery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcome: DeliveryOutcome,
    pub detail: Option<String>,
    pub account_id: Option<AccountId>,
}

impl DispatchReport {
    fn processed(handled: &HandledEvent) -> Self {
        match handled {
            HandledEvent::Subscription(result) => Self {
                outcome: DeliveryOutcome::Processed,
                detail: Some(format!(
                    "{} on {} via {}",
                    result.status.as_str(),
                    result.plan.as_str(),
                    result.source
                )),
                account_id: Some(result.account_id),
            },
            HandledEvent::Purchase(result) => Self {
                outcome: DeliveryOutcome::Processed,
                detail: Some(format!(
                    "{} inserted, {} duplicate",
                    result.inserted, result.duplicates
                )),
                account_id: match &result.owner {
                    PurchaseOwner::Account(id) => Some(*id),
                    PurchaseOwner::Guest(_) => None,
                },
            },
        }
    }

    fn from_error(err: &WebhookError) -> Self {
        let outcome = match err.category() {
            ErrorCategory::Ignored => DeliveryOutcome::Ignored,
            ErrorCategory::UnresolvedIdentity => DeliveryOutcome::Unresolved,
            _ => DeliveryOutcome::Failed,
        };
        Self {
            outcome,
            detail: Some(err.to_string()),
            account_id: None,
        }
    }

    /// Report for an event acknowledged without being dispatched.
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            outcome: DeliveryOutcome::Ignored,
            detail: Some(reason.into()),
            account_id: None,
        }
    }
}

/// Routes events by type and checkout mode.
pub struct BillingEventDispatcher {
    subscriptions: ReconcileSubscriptionHandler,
    purchases: RecordPurchaseHandler,
}

impl BillingEventDispatcher {
    pub fn new(subscriptions: ReconcileSubscriptionHandler, purchases: RecordPurchaseHandler) -> Self {
        Self {
            subscriptions,
            purchases,
        }
    }

    /// Dispatches one verified event. Never fails.
    pub async fn dispatch(&self, event: &StripeEvent) -> DispatchReport {
        let result = AssertUnwindSafe(self.route(event)).catch_unwind().await;

        let result = match result {
            Ok(result) => result,
            Err(panic) => Err(WebhookError::HandlerPanicked(panic_message(panic.as_ref()))),
        };

        match result {
            Ok(handled) => DispatchReport::processed(&handled),
            Err(err) => {
                Self::log_absorbed(event, &err);
                DispatchReport::from_error(&err)
            }
        }
    }

    async fn route(&self, event: &StripeEvent) -> Result<HandledEvent, WebhookError> {
        match BillingEvent::from_event(event)? {
            BillingEvent::CheckoutCompleted(session) => match session.mode {
                CheckoutMode::Subscription => self
                    .subscriptions
                    .checkout_completed(&session)
                    .await
                    .map(HandledEvent::Subscription),
                CheckoutMode::Payment => {
                    let completed_at = event.occurred_at().unwrap_or_else(Timestamp::now);
                    self.purchases
                        .handle(&session, completed_at)
                        .await
                        .map(HandledEvent::Purchase)
                }
                CheckoutMode::Setup | CheckoutMode::Other => Err(WebhookError::Ignored(format!(
                    "checkout {} is not a purchase",
                    session.id
                ))),
            },
            BillingEvent::SubscriptionUpdated(subscription) => self
                .subscriptions
                .subscription_updated(&subscription)
                .await
                .map(HandledEvent::Subscription),
            BillingEvent::SubscriptionDeleted(subscription) => self
                .subscriptions
                .subscription_deleted(&subscription)
                .await
                .map(HandledEvent::Subscription),
            BillingEvent::InvoicePaid(invoice) => self
                .subscriptions
                .invoice_paid(&invoice)
                .await
                .map(HandledEvent::Subscription),
            BillingEvent::InvoicePaymentFailed(invoice) => self
                .subscriptions
                .invoice_failed(&invoice)
                .await
                .map(HandledEvent::Subscription),
            BillingEvent::Unhandled(event_type) => Err(WebhookError::Ignored(format!(
                "unhandled event type {}",
                event_type
            ))),
        }
    }

    fn log_absorbed(event: &StripeEvent, err: &WebhookError) {
        let category = err.category();
        match category {
            ErrorCategory::Ignored => info!(
                event_id = %event.id,
                event_type = %event.event_type,
                reason = %err,
                "Event ignored"
            ),
            ErrorCategory::UnresolvedIdentity => warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %err,
                "No account matched event, acknowledged without changes"
            ),
            _ => error!(
                event_id = %event.id,
                event_type = %event.event_type,
                category = category.as_str(),
                error = %err,
                "Event handler failed, acknowledged anyway"
            ),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
