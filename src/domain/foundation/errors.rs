//! Error types shared by the domain, ports and store adapters.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A value could not be constructed from its raw form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is empty")]
    EmptyField { field: &'static str },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: &'static str) -> Self {
        ValidationError::EmptyField { field }
    }

    pub fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField { field } | ValidationError::InvalidFormat { field, .. } => {
                field
            }
        }
    }
}

/// What kind of failure a [`DomainError`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Input rejected while building a domain value.
    ValidationFailed,
    /// A stored row holds a value this build cannot interpret.
    InvalidStoredValue,
    /// The store could not be reached or rejected the statement.
    DatabaseError,
    /// The payment processor call failed.
    ProcessorError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidStoredValue => "INVALID_STORED_VALUE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ProcessorError => "PROCESSOR_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a port implementation.
///
/// `details` carries structured context (table, constraint, processor code)
/// that ends up as log fields.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<&'static str, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// A column held `value`, which does not parse as its domain type.
    pub fn invalid_stored_value(column: &'static str, value: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidStoredValue,
            format!("Invalid {}: {}", column, value),
        )
        .with_detail("column", column)
    }

    pub fn with_detail(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.details.insert(key, value.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let field = err.field();
        DomainError::new(ErrorCode::ValidationFailed, err.to_string()).with_detail("field", field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_name_the_field() {
        assert_eq!(
            ValidationError::empty_field("customer_email").to_string(),
            "customer_email is empty"
        );
        assert_eq!(
            ValidationError::invalid_format("plan", "unknown tier 'gold'").to_string(),
            "plan is malformed: unknown tier 'gold'"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::database("connection reset");
        assert_eq!(err.to_string(), "[DATABASE_ERROR] connection reset");
    }

    #[test]
    fn invalid_stored_value_records_the_column() {
        let err = DomainError::invalid_stored_value("status", "paused");

        assert_eq!(err.code, ErrorCode::InvalidStoredValue);
        assert_eq!(err.message, "Invalid status: paused");
        assert_eq!(err.details.get("column").map(String::as_str), Some("status"));
    }

    #[test]
    fn validation_error_converts_with_field_detail() {
        let err: DomainError = ValidationError::empty_field("item_id").into();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.get("field").map(String::as_str), Some("item_id"));
    }
}
