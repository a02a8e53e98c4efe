//! Timestamp type used throughout the service.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Clients may supply their
//! own capture timestamp; everything server-assigned uses [`TimestampMillis::now`].

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampMillis(u64);

impl TimestampMillis {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the current system time as a `TimestampMillis`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64;
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Render as an ISO-8601 / RFC 3339 string (`2024-01-15T09:30:00.000Z`).
    pub fn to_iso8601(&self) -> String {
        DateTime::from_timestamp_millis(self.0 as i64)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for TimestampMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_rendering() {
        let ts = TimestampMillis::new(0);
        assert_eq!(ts.to_iso8601(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn now_is_after_epoch() {
        assert!(TimestampMillis::now() > TimestampMillis::EPOCH);
    }

    #[test]
    fn ordering_follows_millis() {
        assert!(TimestampMillis::new(2000) > TimestampMillis::new(1999));
    }
}
