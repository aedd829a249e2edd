//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"`, compared in constant time,
//! with a bounded window on the signed timestamp to limit replays.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

/// Default maximum age for a signed delivery (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. Stripe sends several while a secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>...][,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value.trim()).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                // v0 and unknown schemes are not trusted
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret. `None` when not configured.
    secret: Option<SecretString>,
    /// Maximum accepted age of the signed timestamp, in seconds.
    tolerance_secs: i64,
}

impl std::fmt::Debug for StripeWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the given secret and the default tolerance.
    ///
    /// An empty secret counts as not configured.
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Creates a verifier from a plain secret string.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self::new(Some(SecretString::new(secret.into())))
    }

    /// Overrides the replay tolerance window.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Returns true if a signing secret is configured.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies the webhook signature against the current time and parses the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StripeEvent, WebhookError> {
        self.verify_and_parse_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Verifies the webhook signature at a given time and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Require a configured secret
    /// 2. Parse the signature header
    /// 3. Validate timestamp is within the tolerance window
    /// 4. Compare each v1 signature against the expected HMAC in constant time
    /// 5. Parse the JSON payload into a StripeEvent
    ///
    /// # Errors
    ///
    /// - `MissingSecret` - No signing secret configured
    /// - `MissingSignature` - No signature header on the request
    /// - `ParseError` - Failed to parse header or JSON payload
    /// - `TimestampOutOfRange` - Signed timestamp older than the tolerance
    /// - `InvalidTimestamp` - Signed timestamp in the future
    /// - `InvalidSignature` - No v1 signature matched
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let secret = self.secret.as_ref().ok_or(WebhookError::MissingSecret)?;

        let header_value = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let header = SignatureHeader::parse(header_value)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = compute_signature(secret.expose_secret(), header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), WebhookError> {
        let age = now
            .checked_sub(timestamp)
            .ok_or(WebhookError::InvalidTimestamp)?;

        if age > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfRange);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }
}

/// Computes the HMAC-SHA256 signature for the given timestamp and payload.
fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds a valid `Stripe-Signature` header value for a payload.
///
/// Used by tests and local tooling that need to sign deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    match compute_signature(secret, timestamp, payload) {
        Ok(signature) => format!("t={},v1={}", timestamp, hex::encode(signature)),
        Err(_) => format!("t={}", timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_704_067_200;

    fn payload() -> &'static str {
        r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false,"api_version":"2023-10-16"}"#
    }

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::with_secret(TEST_SECRET)
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_v1_only() {
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", "a".repeat(64))).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signatures.len(), 1);
        assert_eq!(header.v1_signatures[0].len(), 32);
    }

    #[test]
    fn parse_header_collects_every_v1() {
        let header_str = format!(
            "t=1234567890,v1={},v1={},v0={}",
            "a".repeat(64),
            "b".repeat(64),
            "c".repeat(64)
        );

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_with_only_v0_fails() {
        let result = SignatureHeader::parse(&format!("t=1234567890,v0={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_no_equals_fails() {
        let result = SignatureHeader::parse("t1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let header = sign_payload(TEST_SECRET, NOW, payload().as_bytes());

        let event = verifier()
            .verify_and_parse_at(payload().as_bytes(), Some(&header), NOW)
            .unwrap();

        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn verify_with_current_clock() {
        let now = chrono::Utc::now().timestamp();
        let header = sign_payload(TEST_SECRET, now, payload().as_bytes());

        assert!(verifier()
            .verify_and_parse(payload().as_bytes(), Some(&header))
            .is_ok());
    }

    #[test]
    fn verify_accepts_any_matching_v1() {
        let valid = sign_payload(TEST_SECRET, NOW, payload().as_bytes());
        let (_, good_sig) = valid.split_once(",v1=").unwrap();
        let header = format!("t={},v1={},v1={}", NOW, "a".repeat(64), good_sig);

        assert!(verifier()
            .verify_and_parse_at(payload().as_bytes(), Some(&header), NOW)
            .is_ok());
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let header = sign_payload("whsec_other", NOW, payload().as_bytes());

        let result = verifier().verify_and_parse_at(payload().as_bytes(), Some(&header), NOW);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let header = sign_payload(TEST_SECRET, NOW, payload().as_bytes());
        let tampered = payload().replace("evt_test123", "evt_hacked");

        let result = verifier().verify_and_parse_at(tampered.as_bytes(), Some(&header), NOW);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn missing_secret_is_reported_before_header_checks() {
        let verifier = StripeWebhookVerifier::new(None);

        let result = verifier.verify_and_parse_at(payload().as_bytes(), None, NOW);

        assert!(matches!(result, Err(WebhookError::MissingSecret)));
        assert!(!verifier.is_configured());
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let verifier = StripeWebhookVerifier::with_secret("");
        assert!(!verifier.is_configured());
    }

    #[test]
    fn missing_header_fails() {
        let result = verifier().verify_and_parse_at(payload().as_bytes(), None, NOW);
        assert!(matches!(result, Err(WebhookError::MissingSignature)));

        let result = verifier().verify_and_parse_at(payload().as_bytes(), Some("  "), NOW);
        assert!(matches!(result, Err(WebhookError::MissingSignature)));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains(TEST_SECRET));
        assert!(rendered.contains("REDACTED"));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_at_boundary_succeeds() {
        assert!(verifier().validate_timestamp(NOW - 300, NOW).is_ok());
    }

    #[test]
    fn timestamp_just_past_boundary_fails() {
        let result = verifier().validate_timestamp(NOW - 301, NOW);
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn extreme_timestamps_are_rejected_without_overflow() {
        assert!(matches!(
            verifier().validate_timestamp(i64::MIN, NOW),
            Err(WebhookError::InvalidTimestamp)
        ));
        assert!(matches!(
            verifier().validate_timestamp(i64::MAX, -NOW),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    #[test]
    fn minimum_header_timestamp_gets_a_rejection() {
        let result = verifier().verify_and_parse_at(
            b"{}",
            Some("t=-9223372036854775808,v1=00"),
            1_700_000_000,
        );
        assert!(matches!(result, Err(WebhookError::InvalidTimestamp)));
        assert_eq!(
            result.unwrap_err().status_code(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn timestamp_from_future_with_skew_succeeds() {
        assert!(verifier().validate_timestamp(NOW + 30, NOW).is_ok());
    }

    #[test]
    fn timestamp_from_future_beyond_skew_fails() {
        let result = verifier().validate_timestamp(NOW + 120, NOW);
        assert!(matches!(result, Err(WebhookError::InvalidTimestamp)));
    }

    #[test]
    fn custom_tolerance_is_honoured() {
        let verifier = verifier().with_tolerance(60);
        let result = verifier.validate_timestamp(NOW - 120, NOW);
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn stale_but_correctly_signed_delivery_is_rejected() {
        let signed_at = NOW - 600;
        let header = sign_payload(TEST_SECRET, signed_at, payload().as_bytes());

        let result = verifier().verify_and_parse_at(payload().as_bytes(), Some(&header), NOW);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    // ══════════════════════════════════════════════════════════════
    // Payload Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_invalid_json_fails() {
        let body = "not valid json";
        let header = sign_payload(TEST_SECRET, NOW, body.as_bytes());

        let result = verifier().verify_and_parse_at(body.as_bytes(), Some(&header), NOW);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }
}
