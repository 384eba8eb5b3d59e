use chrono::DateTime;
use derive_more::{Add, AddAssign, Display, FromStr, Sub, SubAssign};
use serde::Serialize;
use thiserror::Error as ThisError;

///
/// Timestamp
/// (in seconds)
///

#[derive(
    Add,
    AddAssign,
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    FromStr,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Sub,
    SubAssign,
)]
#[repr(transparent)]
pub struct Timestamp(u64);

///
/// TimestampParseError
///

#[derive(Debug, ThisError)]
pub enum TimestampParseError {
    #[error("timestamp parse error: {0}")]
    Format(String),

    #[error("timestamp before epoch")]
    BeforeEpoch,
}

impl Timestamp {
    pub const EPOCH: Self = Self(u64::MIN);
    pub const MAX: Self = Self(u64::MAX);

    /// Construct from seconds.
    #[must_use]
    pub const fn from_seconds(secs: u64) -> Self {
        Self(secs)
    }

    /// Construct from milliseconds (truncate to seconds).
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms / 1_000)
    }

    #[allow(clippy::cast_sign_loss)]
    pub fn parse_rfc3339(s: &str) -> Result<Self, TimestampParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| TimestampParseError::Format(e.to_string()))?;
        let ts = dt.timestamp();
        if ts < 0 {
            return Err(TimestampParseError::BeforeEpoch);
        }

        Ok(Self(ts as u64))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let ts = Timestamp::parse_rfc3339("2024-05-01T00:00:00Z").unwrap();
        assert_eq!(ts.get(), 1_714_521_600);
    }

    #[test]
    fn rejects_pre_epoch() {
        assert!(matches!(
            Timestamp::parse_rfc3339("1969-12-31T23:59:59Z"),
            Err(TimestampParseError::BeforeEpoch)
        ));
    }
}
