//! HandleBillingWebhookHandler - one delivery from raw bytes to outcome.
//!
//! Verify, dispatch, log the delivery. Only verification and missing
//! configuration produce an error; everything after that is acknowledged.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::dispatcher::{BillingEventDispatcher, DispatchReport};
use crate::domain::billing::{StripeEvent, StripeWebhookVerifier, WebhookError};
use crate::ports::{DeliveryLog, DeliveryRecord};

/// Command to handle a billing webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if present.
    pub signature: Option<String>,
}

/// Result of an acknowledged delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub report: DispatchReport,
}

/// Handler for billing webhook deliveries.
pub struct HandleBillingWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    dispatcher: Arc<BillingEventDispatcher>,
    delivery_log: Arc<dyn DeliveryLog>,
    require_livemode: bool,
}

impl HandleBillingWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        dispatcher: Arc<BillingEventDispatcher>,
        delivery_log: Arc<dyn DeliveryLog>,
    ) -> Self {
        Self {
            verifier,
            dispatcher,
            delivery_log,
            require_livemode: false,
        }
    }

    /// Acknowledge test-mode events without applying them.
    pub fn with_require_livemode(mut self, require_livemode: bool) -> Self {
        self.require_livemode = require_livemode;
        self
    }

    /// Handles one delivery.
    ///
    /// # Errors
    ///
    /// Only errors for which [`WebhookError::is_rejection`] holds: the
    /// delivery could not be verified, or no signing secret is configured.
    /// Nothing is written in either case.
    pub async fn handle(
        &self,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<HandleBillingWebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())
            .map_err(|err| {
                match &err {
                    WebhookError::MissingSecret => {
                        error!("Billing webhook received but no signing secret is configured")
                    }
                    _ => warn!(
                        category = err.category().as_str(),
                        error = %err,
                        "Billing webhook rejected"
                    ),
                }
                err
            })?;

        let report = if self.require_livemode && !event.is_live() {
            info!(
                event_id = %event.id,
                event_type = %event.event_type,
                "Test mode event ignored"
            );
            DispatchReport::ignored("test mode event")
        } else {
            self.dispatcher.dispatch(&event).await
        };

        self.record_delivery(&event, &report).await;

        Ok(HandleBillingWebhookResult {
            event_id: event.id,
            event_type: event.event_type,
            report,
        })
    }

    /// Writes the delivery log entry. A failed write is logged and dropped.
    async fn record_delivery(&self, event: &StripeEvent, report: &DispatchReport) {
        let record = DeliveryRecord::new(
            event.id.clone(),
            event.event_type.clone(),
            report.outcome,
            report.detail.clone(),
            serde_json::to_value(event).unwrap_or_default(),
        );

        match self.delivery_log.record(record).await {
            Ok(stored) => info!(
                event_id = %stored.event_id,
                event_type = %stored.event_type,
                outcome = %stored.outcome,
                delivery_count = stored.delivery_count,
                "Billing webhook processed"
            ),
            Err(err) => error!(
                event_id = %event.id,
                error = %err,
                "Failed to record billing delivery"
            ),
        }
    }
}
