//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of an account in the platform's account store.
///
/// Accounts are owned by the managed auth service; ids arrive here as UUID
/// strings, either from our own lookups or from processor metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random AccountId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AccountId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses an account id carried in processor metadata.
    ///
    /// Metadata is free-form text, so blank values are treated as absent
    /// rather than as errors.
    pub fn from_metadata(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        value.parse().ok()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("account_id", e.to_string()))
    }
}

/// Unique identifier for a purchase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(Uuid);

impl PurchaseId {
    /// Creates a new random PurchaseId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PurchaseId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PurchaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized customer email used for guest purchases and account matching.
///
/// Stored lowercase and trimmed so that `Ana@Example.com` and
/// `ana@example.com ` match the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerEmail(String);

impl CustomerEmail {
    /// Creates a normalized email, returning error if empty or missing `@`.
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = email.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("customer_email"));
        }
        if !normalized.contains('@') {
            return Err(ValidationError::invalid_format(
                "customer_email",
                "missing @ symbol",
            ));
        }
        Ok(Self(normalized))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parses_uuid_string() {
        let uuid = Uuid::new_v4();
        let id: AccountId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn account_id_rejects_garbage() {
        let result = "not-a-uuid".parse::<AccountId>();
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn account_id_from_metadata_ignores_blank_values() {
        assert_eq!(AccountId::from_metadata(""), None);
        assert_eq!(AccountId::from_metadata("   "), None);
        assert_eq!(AccountId::from_metadata("acct_42"), None);
    }

    #[test]
    fn account_id_from_metadata_trims_whitespace() {
        let uuid = Uuid::new_v4();
        let id = AccountId::from_metadata(&format!(" {} ", uuid)).unwrap();
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn account_id_serializes_transparently() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn customer_email_is_normalized() {
        let email = CustomerEmail::new("  Traveler@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "traveler@example.com");
    }

    #[test]
    fn customer_email_rejects_empty() {
        assert!(matches!(
            CustomerEmail::new("  "),
            Err(ValidationError::EmptyField { .. })
        ));
    }

    #[test]
    fn customer_email_rejects_missing_at() {
        assert!(matches!(
            CustomerEmail::new("traveler.example.com"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn purchase_ids_are_unique() {
        assert_ne!(PurchaseId::new(), PurchaseId::new());
    }
}
