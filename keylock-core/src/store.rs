//! Key-value store contract used by the locks.

use crate::error::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Shared, network-accessible key-value store holding lock records.
///
/// Every operation is a single round trip and must be atomic on the store
/// side. Implementations report connectivity problems as
/// [`StoreError`](crate::StoreError) instead of folding them into a
/// negative answer.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write `value` only if `key` is currently absent.
    ///
    /// # Returns
    ///
    /// Returns `Ok(true)` if the write happened, `Ok(false)` if the key
    /// already existed.
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// Write `value` only if `key` is absent, and let the store expire the
    /// key after `ttl`.
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool>;

    /// Get the current value of `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value of `key`, returning the value it had before.
    async fn get_and_set(&self, key: &str, value: &str) -> StoreResult<Option<String>>;

    /// Remove `key` unconditionally.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Replace the value of `key` with `new` only if it currently equals
    /// `expected`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(false)` if the key is absent or holds another value.
    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> StoreResult<bool>;

    /// Delete `key` only if its value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        (**self).set_if_absent(key, value).await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        (**self).set_if_absent_with_ttl(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key).await
    }

    async fn get_and_set(&self, key: &str, value: &str) -> StoreResult<Option<String>> {
        (**self).get_and_set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key).await
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> StoreResult<bool> {
        (**self).compare_and_swap(key, expected, new).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        (**self).compare_and_delete(key, expected).await
    }
}
