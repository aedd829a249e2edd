//! Configuration error types

use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A configuration value that loaded but cannot be used
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must be set")]
    MissingRequired(&'static str),

    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must start with `{expected}`")]
    UnexpectedPrefix {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Cannot bind to {0}")]
    InvalidBindAddress(String),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("database.pool.min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },

    #[error("Invalid price to plan table: {0}")]
    InvalidPriceTable(String),
}

impl ValidationError {
    /// Fails with `OutOfRange` unless `min <= value <= max`.
    pub(crate) fn ensure_range(
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    ) -> Result<(), ValidationError> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Fails with `UnexpectedPrefix` unless `value` starts with `expected`.
    pub(crate) fn ensure_prefix(
        field: &'static str,
        value: &str,
        expected: &'static str,
    ) -> Result<(), ValidationError> {
        if value.starts_with(expected) {
            Ok(())
        } else {
            Err(ValidationError::UnexpectedPrefix { field, expected })
        }
    }
}
