//! Deadline-token distributed lock.
//!
//! The stored value of a lock key is the deadline (epoch milliseconds) after
//! which the holder is presumed dead. Acquisition either creates the key,
//! or takes it over once that deadline has passed. The lock itself keeps no
//! state: everything lives in the [`KeyValueStore`].

use crate::clock::{Clock, SystemClock};
use crate::config::{LockConfig, TakeoverMode};
use crate::error::LockResult;
use crate::store::KeyValueStore;
use crate::token::Deadline;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a release attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller's record was removed.
    Released,
    /// The key was absent or held by another token; nothing was changed.
    NotHeld,
}

impl ReleaseOutcome {
    /// Check if the record was removed.
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }
}

/// Read-only view of a lock key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No record.
    Unlocked,
    /// Held, deadline not yet passed.
    Held { deadline: Deadline },
    /// Held, but the deadline has passed and the key may be taken over.
    Expired { deadline: Deadline },
    /// The stored value is not a deadline token.
    Unreadable(String),
}

/// Mutual exclusion lock coordinated through a shared key-value store.
///
/// # Examples
///
/// ```rust,ignore
/// use keylock_core::{DistributedLock, MemoryStore};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
/// let token = lock.token_for(Duration::from_secs(10));
///
/// if lock.acquire("seckill:1", &token).await? {
///     // critical section
///     lock.release("seckill:1", &token).await?;
/// }
/// ```
pub struct DistributedLock<S: ?Sized, C = SystemClock> {
    store: Arc<S>,
    clock: C,
    config: LockConfig,
}

impl<S: KeyValueStore + ?Sized> DistributedLock<S, SystemClock> {
    /// Create a lock over `store` using the system clock.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore + ?Sized, C: Clock> DistributedLock<S, C> {
    /// Create a lock over `store` reading time from `clock`.
    pub fn with_clock(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            clock,
            config: LockConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: LockConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Token whose deadline is the configured default lease from now.
    pub fn token(&self) -> String {
        self.token_for(self.config.default_lease)
    }

    /// Token whose deadline is `lease` from now.
    pub fn token_for(&self, lease: Duration) -> String {
        Deadline::after(&self.clock, lease).to_string()
    }

    /// Try once to acquire `key` with `token`.
    ///
    /// `token` is this attempt's deadline; see [`token_for`](Self::token_for).
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the key was free, or held with a passed deadline and
    ///   this call won the takeover.
    /// - `Ok(false)` if the lock is busy, the takeover was lost, or the
    ///   stored value cannot be read as a deadline.
    /// - `Err(LockError::Store)` if the store failed.
    /// - `Err(LockError::MalformedToken)` if `token` is not a deadline.
    pub async fn acquire(&self, key: &str, token: &str) -> LockResult<bool> {
        // A record that can never be read as a deadline would never expire.
        Deadline::parse(token)?;

        let key = self.config.build_key(key);

        if self.store.set_if_absent(&key, token).await? {
            info!(key = %key, "Acquired lock");
            return Ok(true);
        }

        let Some(observed) = self.store.get(&key).await? else {
            debug!(key = %key, "Lock released between create and read");
            return Ok(false);
        };

        let deadline = match Deadline::parse(&observed) {
            Ok(deadline) => deadline,
            Err(_) => {
                warn!(key = %key, value = %observed, "Cannot verify lock expiry, refusing to take over");
                return Ok(false);
            }
        };

        if !deadline.is_expired_at(self.clock.now_millis()) {
            debug!(key = %key, deadline = %deadline, "Lock busy");
            return Ok(false);
        }

        if self.take_over(&key, &observed, token).await? {
            info!(key = %key, expired = %deadline, "Lock expired, taken over");
            Ok(true)
        } else {
            warn!(key = %key, "Lost takeover race for expired lock");
            Ok(false)
        }
    }

    async fn take_over(&self, key: &str, observed: &str, token: &str) -> LockResult<bool> {
        match self.config.takeover {
            TakeoverMode::CompareAndSwap => {
                Ok(self.store.compare_and_swap(key, observed, token).await?)
            }
            TakeoverMode::GetAndSet => {
                let previous = self.store.get_and_set(key, token).await?;
                Ok(previous.as_deref() == Some(observed))
            }
        }
    }

    /// Release `key` if it is still held by `token`.
    ///
    /// Matching and deleting is one atomic store operation, so a stale
    /// holder can never remove a record that was taken over.
    pub async fn release(&self, key: &str, token: &str) -> LockResult<ReleaseOutcome> {
        let key = self.config.build_key(key);

        if self.store.compare_and_delete(&key, token).await? {
            debug!(key = %key, "Released lock");
            Ok(ReleaseOutcome::Released)
        } else {
            debug!(key = %key, "Release skipped, lock not held by token");
            Ok(ReleaseOutcome::NotHeld)
        }
    }

    /// Best-effort release: failures are logged and dropped.
    ///
    /// A failed release leaves the lock stranded until its deadline passes.
    /// Use [`release`](Self::release) when the caller needs to know.
    pub async fn release_quietly(&self, key: &str, token: &str) {
        if let Err(e) = self.release(key, token).await {
            error!(key = %key, error = %e, "Failed to release lock");
        }
    }

    /// Inspect the current state of `key` without changing it.
    pub async fn inspect(&self, key: &str) -> LockResult<LockState> {
        let key = self.config.build_key(key);

        let state = match self.store.get(&key).await? {
            None => LockState::Unlocked,
            Some(value) => match Deadline::parse(&value) {
                Ok(deadline) if deadline.is_expired_at(self.clock.now_millis()) => {
                    LockState::Expired { deadline }
                }
                Ok(deadline) => LockState::Held { deadline },
                Err(_) => LockState::Unreadable(value),
            },
        };
        Ok(state)
    }
}
