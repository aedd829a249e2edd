//! Webhook error types for billing webhook handling.
//!
//! Every failure a delivery can hit, grouped into the categories that decide
//! the HTTP response. Only verification failures and missing configuration
//! ever reach the processor as a non-2xx status.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Signature header missing from the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Failed to parse the signature header or the event envelope.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No signing secret is configured; nothing can be verified.
    #[error("Webhook signing secret is not configured")]
    MissingSecret,

    /// A handled event type carried a payload we could not read.
    #[error("Invalid payload for {event_type}: {reason}")]
    InvalidPayload {
        event_type: &'static str,
        reason: String,
    },

    /// Required field missing from a typed payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No account could be matched to the event.
    #[error("Unresolved identity: {0}")]
    UnresolvedIdentity(String),

    /// Processor API call failed or timed out.
    #[error("Processor error: {0}")]
    Processor(String),

    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Handler panicked; caught by the dispatcher.
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),
}

/// Failure categories used for status mapping and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing signature, stale or malformed delivery.
    AuthenticationFailure,
    /// The service cannot verify anything until configured.
    Configuration,
    /// No account or email match.
    UnresolvedIdentity,
    /// Processor or store call failed.
    TransientDependencyFailure,
    /// Payload did not match the shape expected for its type.
    MalformedPayload,
    /// Not an error: event acknowledged without changes.
    Ignored,
    /// Handler bug.
    Internal,
}

impl ErrorCategory {
    /// Stable label for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::AuthenticationFailure => "authentication_failure",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::UnresolvedIdentity => "unresolved_identity",
            ErrorCategory::TransientDependencyFailure => "transient_dependency_failure",
            ErrorCategory::MalformedPayload => "malformed_payload",
            ErrorCategory::Ignored => "ignored",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl WebhookError {
    /// Category of the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::MissingSignature
            | WebhookError::ParseError(_) => ErrorCategory::AuthenticationFailure,
            WebhookError::MissingSecret => ErrorCategory::Configuration,
            WebhookError::InvalidPayload { .. } | WebhookError::MissingField(_) => {
                ErrorCategory::MalformedPayload
            }
            WebhookError::UnresolvedIdentity(_) => ErrorCategory::UnresolvedIdentity,
            WebhookError::Processor(_) | WebhookError::Database(_) => {
                ErrorCategory::TransientDependencyFailure
            }
            WebhookError::HandlerPanicked(_) => ErrorCategory::Internal,
            WebhookError::Ignored(_) => ErrorCategory::Ignored,
        }
    }

    /// Returns true if the delivery must be rejected before processing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::AuthenticationFailure | ErrorCategory::Configuration
        )
    }

    /// Maps the error to the HTTP status returned to the processor.
    ///
    /// - 400: delivery could not be verified; the processor's own retry
    ///   policy decides what happens next
    /// - 500: signing secret missing
    /// - 200: everything past verification, including handler failures
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::AuthenticationFailure => StatusCode::BAD_REQUEST,
            ErrorCategory::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::UnresolvedIdentity
            | ErrorCategory::TransientDependencyFailure
            | ErrorCategory::MalformedPayload
            | ErrorCategory::Ignored
            | ErrorCategory::Internal => StatusCode::OK,
        }
    }
}

/// Converts DomainError to WebhookError for store operations.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_displays_correctly() {
        assert_eq!(format!("{}", WebhookError::InvalidSignature), "Invalid signature");
    }

    #[test]
    fn invalid_payload_displays_type_and_reason() {
        let err = WebhookError::InvalidPayload {
            event_type: "invoice.payment_failed",
            reason: "missing field `id`".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Invalid payload for invoice.payment_failed: missing field `id`"
        );
    }

    #[test]
    fn domain_error_converts_to_database() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "pool timed out").into();
        assert!(matches!(err, WebhookError::Database(msg) if msg.contains("pool timed out")));
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn authentication_failures_return_bad_request() {
        for err in [
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::MissingSignature,
            WebhookError::ParseError("bad header".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
            assert!(err.is_rejection());
        }
    }

    #[test]
    fn missing_secret_returns_internal_error() {
        let err = WebhookError::MissingSecret;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_rejection());
    }

    #[test]
    fn processing_failures_are_acknowledged() {
        for err in [
            WebhookError::UnresolvedIdentity("no match".to_string()),
            WebhookError::Processor("timeout".to_string()),
            WebhookError::Database("connection lost".to_string()),
            WebhookError::MissingField("customer"),
            WebhookError::HandlerPanicked("boom".to_string()),
            WebhookError::Ignored("unknown type".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::OK, "{}", err);
            assert!(!err.is_rejection());
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Category Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn dependency_failures_are_transient() {
        assert_eq!(
            WebhookError::Processor("503".to_string()).category(),
            ErrorCategory::TransientDependencyFailure
        );
        assert_eq!(
            WebhookError::Database("deadlock".to_string()).category(),
            ErrorCategory::TransientDependencyFailure
        );
    }

    #[test]
    fn category_labels_are_snake_case() {
        assert_eq!(
            ErrorCategory::TransientDependencyFailure.as_str(),
            "transient_dependency_failure"
        );
        assert_eq!(ErrorCategory::UnresolvedIdentity.as_str(), "unresolved_identity");
    }
}
