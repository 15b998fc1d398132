//! Deadline tokens.
//!
//! A deadline token is the decimal epoch-millisecond instant after which a
//! held lock may be taken over, e.g. `"1557460800000"`.

use crate::clock::Clock;
use crate::error::LockError;
use std::fmt;
use std::time::Duration;

/// Lock expiry deadline in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(i64);

impl Deadline {
    /// Create a deadline from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Deadline `lease` after the clock's current reading.
    pub fn after(clock: &dyn Clock, lease: Duration) -> Self {
        let lease_ms = i64::try_from(lease.as_millis()).unwrap_or(i64::MAX);
        Self(clock.now_millis().saturating_add(lease_ms))
    }

    /// Parse a stored token.
    ///
    /// Anything that is not a plain decimal integer is rejected; the caller
    /// decides what an unverifiable deadline means.
    pub fn parse(token: &str) -> Result<Self, LockError> {
        token
            .parse::<i64>()
            .map(Self)
            .map_err(|_| LockError::MalformedToken(token.to_string()))
    }

    /// Epoch milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Check if the deadline lies strictly before `now_millis`.
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.0 < now_millis
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
