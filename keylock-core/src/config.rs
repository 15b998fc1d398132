//! Lock configuration.

use crate::error::LockError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How an expired deadline lock is taken over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TakeoverMode {
    /// One compare-and-swap against the observed value. Exactly one of
    /// several concurrent contenders wins.
    #[default]
    #[serde(rename = "cas")]
    CompareAndSwap,

    /// Swap first, then compare the returned value with the observed one.
    ///
    /// Only one contender is told it won, but a loser's swap still lands and
    /// overwrites the winner's token. Kept for stores without conditional
    /// writes; unsafe under contention.
    #[serde(rename = "getset")]
    GetAndSet,
}

impl FromStr for TakeoverMode {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cas" | "compare-and-swap" => Ok(Self::CompareAndSwap),
            "getset" | "get-and-set" => Ok(Self::GetAndSet),
            other => Err(LockError::Config(format!("unknown takeover mode: {other}"))),
        }
    }
}

/// Lock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Prefix prepended to every lock key.
    #[serde(default)]
    pub key_prefix: String,
    /// Lease used by [`DistributedLock::token`](crate::DistributedLock::token).
    #[serde(with = "millis_serde", default = "default_lease")]
    pub default_lease: Duration,
    /// Takeover strategy for expired deadline locks.
    #[serde(default)]
    pub takeover: TakeoverMode,
}

fn default_lease() -> Duration {
    Duration::from_secs(30)
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            default_lease: default_lease(),
            takeover: TakeoverMode::default(),
        }
    }
}

impl LockConfig {
    /// Create a builder.
    pub fn builder() -> LockConfigBuilder {
        LockConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// - `KEYLOCK_KEY_PREFIX`
    /// - `KEYLOCK_LEASE_MS`
    /// - `KEYLOCK_TAKEOVER` (`cas` or `getset`)
    pub fn from_env() -> Result<LockConfigBuilder, LockError> {
        let mut builder = LockConfigBuilder::new();

        if let Ok(prefix) = std::env::var("KEYLOCK_KEY_PREFIX") {
            builder = builder.key_prefix(prefix);
        }

        if let Ok(lease) = std::env::var("KEYLOCK_LEASE_MS") {
            let ms: u64 = lease
                .parse()
                .map_err(|_| LockError::Config(format!("invalid KEYLOCK_LEASE_MS: {lease}")))?;
            builder = builder.default_lease(Duration::from_millis(ms));
        }

        if let Ok(mode) = std::env::var("KEYLOCK_TAKEOVER") {
            builder = builder.takeover(mode.parse()?);
        }

        Ok(builder)
    }

    /// Full store key for a lock name.
    pub fn build_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.key_prefix, key)
        }
    }
}

/// Builder for lock configuration.
#[derive(Default)]
pub struct LockConfigBuilder {
    config: LockConfig,
}

impl LockConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Set the default lease.
    pub fn default_lease(mut self, lease: Duration) -> Self {
        self.config.default_lease = lease;
        self
    }

    /// Set the takeover mode.
    pub fn takeover(mut self, mode: TakeoverMode) -> Self {
        self.config.takeover = mode;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LockConfig {
        self.config
    }
}

mod millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
