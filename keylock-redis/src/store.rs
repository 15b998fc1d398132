//! Redis implementation of the lock store contract.

use async_trait::async_trait;
use keylock_core::{KeyValueStore, StoreError, StoreResult};
use redis::AsyncCommands;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

use crate::{RedisConfig, RedisError, RedisService, Result};

static COMPARE_AND_SWAP: LazyLock<redis::Script> = LazyLock::new(|| {
    redis::Script::new(
        r#"
        if redis.call("get", KEYS[1]) == ARGV[1] then
            redis.call("set", KEYS[1], ARGV[2])
            return 1
        else
            return 0
        end
    "#,
    )
});

static COMPARE_AND_DELETE: LazyLock<redis::Script> = LazyLock::new(|| {
    redis::Script::new(
        r#"
        if redis.call("get", KEYS[1]) == ARGV[1] then
            return redis.call("del", KEYS[1])
        else
            return 0
        end
    "#,
    )
});

/// [`KeyValueStore`] backed by Redis.
///
/// Conditional writes run as Lua scripts so the comparison and the write
/// are one server-side step. Each operation, pool checkout included, is
/// bounded by the configured command timeout.
#[derive(Clone)]
pub struct RedisStore {
    service: Arc<RedisService>,
    key_prefix: String,
    command_timeout: Duration,
}

impl RedisStore {
    /// Connect to Redis and create a store.
    ///
    /// ```rust,ignore
    /// use keylock_redis::{RedisConfig, RedisStore};
    ///
    /// let store = RedisStore::connect(RedisConfig::from_env().build()).await?;
    /// ```
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let service = RedisService::new(config).await?;
        Ok(Self::new(Arc::new(service)))
    }

    /// Create a store over an existing service.
    pub fn new(service: Arc<RedisService>) -> Self {
        let config = service.config();
        Self {
            key_prefix: config.key_prefix.clone(),
            command_timeout: config.command_timeout,
            service,
        }
    }

    /// Get the underlying service.
    pub fn service(&self) -> &Arc<RedisService> {
        &self.service
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.command_timeout, op).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let created: bool = conn.set_nx(&key, value).await?;
            Ok::<_, RedisError>(created)
        })
        .await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let key = self.build_key(key);
        // PX rejects zero.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let result: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(value)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut *conn)
                .await?;
            Ok::<_, RedisError>(result.is_some())
        })
        .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let value: Option<String> = conn.get(&key).await?;
            Ok::<_, RedisError>(value)
        })
        .await
    }

    async fn get_and_set(&self, key: &str, value: &str) -> StoreResult<Option<String>> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let previous: Option<String> = redis::cmd("GETSET")
                .arg(&key)
                .arg(value)
                .query_async(&mut *conn)
                .await?;
            Ok::<_, RedisError>(previous)
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let removed: u32 = conn.del(&key).await?;
            debug!(key = %key, removed, "DEL");
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> StoreResult<bool> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let swapped: i32 = COMPARE_AND_SWAP
                .key(&key)
                .arg(expected)
                .arg(new)
                .invoke_async(&mut *conn)
                .await?;
            Ok::<_, RedisError>(swapped == 1)
        })
        .await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let key = self.build_key(key);
        self.bounded(async {
            let mut conn = self.service.get().await?;
            let deleted: i32 = COMPARE_AND_DELETE
                .key(&key)
                .arg(expected)
                .invoke_async(&mut *conn)
                .await?;
            Ok::<_, RedisError>(deleted == 1)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylock_core::{DistributedLock, LeaseLock, ReleaseOutcome};

    async fn store() -> RedisStore {
        let config = RedisConfig::from_env()
            .key_prefix(format!("keylock-test:{}:", uuid::Uuid::new_v4()))
            .build();
        RedisStore::connect(config).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_conditional_writes() {
        let store = store().await;

        assert!(store.set_if_absent("k", "a").await.unwrap());
        assert!(!store.set_if_absent("k", "b").await.unwrap());
        assert!(!store.compare_and_swap("k", "b", "c").await.unwrap());
        assert!(store.compare_and_swap("k", "a", "c").await.unwrap());
        assert_eq!(store.get_and_set("k", "d").await.unwrap().as_deref(), Some("c"));
        assert!(!store.compare_and_delete("k", "c").await.unwrap());
        assert!(store.compare_and_delete("k", "d").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set_if_absent("k", "e").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_deadline_lock_over_redis() {
        let lock = DistributedLock::new(Arc::new(store().await));
        let token = lock.token_for(Duration::from_secs(10));

        assert!(lock.acquire("seckill:1", &token).await.unwrap());
        assert!(!lock.acquire("seckill:1", &lock.token()).await.unwrap());
        assert_eq!(
            lock.release("seckill:1", &token).await.unwrap(),
            ReleaseOutcome::Released
        );
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_lease_expires_in_redis() {
        let lock = LeaseLock::new(Arc::new(store().await));

        let guard = lock
            .try_acquire("job", Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        let next = lock.try_acquire("job", Duration::from_secs(5)).await.unwrap();
        assert!(next.is_some());
        assert_eq!(guard.release().await.unwrap(), ReleaseOutcome::NotHeld);
    }
}
