//! Points in time as the billing domain sees them.
//!
//! The processor speaks Unix seconds; the stores speak `timestamptz`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// From processor-supplied Unix seconds; `None` outside chrono's range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(Self)
    }

    pub fn unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Whole seconds from `self` until `later`; negative if `later` is earlier.
    pub fn secs_until(&self, later: &Timestamp) -> i64 {
        later.unix_secs() - self.unix_secs()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_round_trip_through_processor_values() {
        // 2024-01-15T00:00:00Z
        let ts = Timestamp::from_unix_secs(1_705_276_800).unwrap();
        assert_eq!(ts.unix_secs(), 1_705_276_800);
        assert_eq!(ts.to_string(), "2024-01-15T00:00:00Z");
    }

    #[test]
    fn unrepresentable_unix_seconds_are_rejected() {
        assert!(Timestamp::from_unix_secs(i64::MAX).is_none());
    }

    #[test]
    fn secs_until_is_signed() {
        let start = Timestamp::from_unix_secs(1_000).unwrap();
        let end = Timestamp::from_unix_secs(1_300).unwrap();

        assert_eq!(start.secs_until(&end), 300);
        assert_eq!(end.secs_until(&start), -300);
    }

    #[test]
    fn serializes_as_rfc3339_string() {
        let ts: Timestamp = serde_json::from_str("\"2024-06-01T12:00:00Z\"").unwrap();
        assert_eq!(ts.unix_secs(), 1_717_243_200);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-06-01T12:00:00Z\"");
    }
}
