//! TTL-based leases.
//!
//! The store expires the key on its own, so the value is only an opaque
//! ownership token and no caller ever compares clocks.

use crate::config::LockConfig;
use crate::error::LockResult;
use crate::lock::ReleaseOutcome;
use crate::store::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lock whose expiry is enforced by the store's per-key TTL.
pub struct LeaseLock<S: ?Sized> {
    store: Arc<S>,
    config: LockConfig,
}

impl<S: KeyValueStore + ?Sized + 'static> LeaseLock<S> {
    /// Create a lease lock over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: LockConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: LockConfig) -> Self {
        self.config = config;
        self
    }

    /// Try once to take `key` for the configured default lease.
    pub async fn try_acquire_default(&self, key: &str) -> LockResult<Option<LeaseGuard<S>>> {
        self.try_acquire(key, self.config.default_lease).await
    }

    /// Try once to take `key` for `ttl`.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> LockResult<Option<LeaseGuard<S>>> {
        let key = self.config.build_key(key);
        let token = Uuid::new_v4().to_string();

        if self.store.set_if_absent_with_ttl(&key, &token, ttl).await? {
            info!(key = %key, ttl = ?ttl, "Acquired lease");
            Ok(Some(LeaseGuard {
                key,
                token,
                store: Arc::clone(&self.store),
                released: false,
            }))
        } else {
            debug!(key = %key, "Failed to acquire lease (already held)");
            Ok(None)
        }
    }
}

/// Held lease. Released on drop if not released explicitly.
pub struct LeaseGuard<S: KeyValueStore + ?Sized + 'static> {
    key: String,
    token: String,
    store: Arc<S>,
    released: bool,
}

impl<S: KeyValueStore + ?Sized + 'static> LeaseGuard<S> {
    /// Store key of this lease.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Ownership token stored under the key.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Release the lease.
    ///
    /// Returns [`ReleaseOutcome::NotHeld`] if the lease already expired,
    /// whether or not someone else has taken the key since. On a store
    /// error the guard still retries the release when it is dropped.
    pub async fn release(mut self) -> LockResult<ReleaseOutcome> {
        let deleted = self.store.compare_and_delete(&self.key, &self.token).await?;
        self.released = true;

        if deleted {
            debug!(key = %self.key, "Released lease");
            Ok(ReleaseOutcome::Released)
        } else {
            warn!(key = %self.key, "Lease expired before release");
            Ok(ReleaseOutcome::NotHeld)
        }
    }
}

impl<S: KeyValueStore + ?Sized + 'static> Drop for LeaseGuard<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        // Without a runtime the lease is left to expire.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);
        let store = Arc::clone(&self.store);

        handle.spawn(async move {
            if let Err(e) = store.compare_and_delete(&key, &token).await {
                warn!(key = %key, error = %e, "Failed to release lease on drop");
            }
        });
    }
}
