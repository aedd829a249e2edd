//! DeliveryLog port - ledger of verified deliveries for offline reconciliation.
//!
//! Every verified delivery lands here with the outcome of processing it. The
//! log never decides whether an event is processed: redeliveries are applied
//! again and rely on the stores' idempotency. It exists so operators can find
//! deliveries that failed or could not be attributed to an account.

use async_trait::async_trait;
use std::fmt;

use crate::domain::foundation::{DomainError, Timestamp};

/// Outcome of processing one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Changes were applied.
    Processed,
    /// Acknowledged without changes (unknown type, test mode, nothing to do).
    Ignored,
    /// A handler failed; the error was absorbed.
    Failed,
    /// No account could be matched.
    Unresolved,
}

impl DeliveryOutcome {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Processed => "processed",
            DeliveryOutcome::Ignored => "ignored",
            DeliveryOutcome::Failed => "failed",
            DeliveryOutcome::Unresolved => "unresolved",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processed" => Some(DeliveryOutcome::Processed),
            "ignored" => Some(DeliveryOutcome::Ignored),
            "failed" => Some(DeliveryOutcome::Failed),
            "unresolved" => Some(DeliveryOutcome::Unresolved),
            _ => None,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the delivery log.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    /// Stripe event ID (evt_xxx format).
    pub event_id: String,

    /// Type of Stripe event (e.g., "checkout.session.completed").
    pub event_type: String,

    /// When this delivery was received.
    pub received_at: Timestamp,

    pub outcome: DeliveryOutcome,

    /// Reason for ignored/failed/unresolved outcomes.
    pub detail: Option<String>,

    /// Original event payload.
    pub payload: serde_json::Value,

    /// How many deliveries of this event have been seen, including this one.
    pub delivery_count: i32,
}

impl DeliveryRecord {
    /// Creates a record for a first delivery.
    pub fn new(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: DeliveryOutcome,
        detail: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            received_at: Timestamp::now(),
            outcome,
            detail,
            payload,
            delivery_count: 1,
        }
    }
}

/// Port for the delivery ledger.
///
/// Implementations key entries on `event_id` (PRIMARY KEY in SQL).
#[async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Record a delivery.
    ///
    /// A new event id is inserted with a count of 1. A known id has its
    /// outcome, detail and `received_at` overwritten and its count
    /// incremented. Returns the stored entry.
    async fn record(&self, record: DeliveryRecord) -> Result<DeliveryRecord, DomainError>;

    /// Find the entry for an event id.
    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<DeliveryRecord>, DomainError>;
}
