//! Concurrent takeover of an expired deadline lock.
//!
//! Every contender is held at a barrier right after reading the expired
//! value, so all of them attempt the takeover against the same observation.

use async_trait::async_trait;
use futures::future::join_all;
use keylock_core::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

struct RendezvousStore {
    inner: MemoryStore,
    after_read: Barrier,
}

impl RendezvousStore {
    fn new(contenders: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            after_read: Barrier::new(contenders),
        }
    }
}

#[async_trait]
impl KeyValueStore for RendezvousStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        self.inner.set_if_absent(key, value).await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.inner.set_if_absent_with_ttl(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self.inner.get(key).await?;
        self.after_read.wait().await;
        Ok(value)
    }

    async fn get_and_set(&self, key: &str, value: &str) -> StoreResult<Option<String>> {
        self.inner.get_and_set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> StoreResult<bool> {
        self.inner.compare_and_swap(key, expected, new).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        self.inner.compare_and_delete(key, expected).await
    }
}

/// Seed an expired record and let `contenders` callers race for it.
async fn race(mode: TakeoverMode, contenders: usize) -> (Arc<RendezvousStore>, Vec<(String, bool)>) {
    let store = Arc::new(RendezvousStore::new(contenders));
    store.inner.set_if_absent("seckill:1", "5000").await.unwrap();

    let clock = ManualClock::new(6000);
    let lock = Arc::new(
        DistributedLock::with_clock(store.clone(), clock)
            .with_config(LockConfig::builder().takeover(mode).build()),
    );

    let attempts = (0..contenders).map(|i| {
        let lock = lock.clone();
        tokio::spawn(async move {
            let token = (11_000 + i as i64).to_string();
            let won = lock.acquire("seckill:1", &token).await.unwrap();
            (token, won)
        })
    });

    let results = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    (store, results)
}

#[tokio::test]
async fn test_compare_and_swap_has_exactly_one_winner() {
    let (store, results) = race(TakeoverMode::CompareAndSwap, 2).await;

    let winners: Vec<_> = results.iter().filter(|(_, won)| *won).collect();
    assert_eq!(winners.len(), 1);

    let stored = store.inner.get("seckill:1").await.unwrap();
    assert_eq!(stored.as_deref(), Some(winners[0].0.as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_compare_and_swap_many_contenders() {
    let (store, results) = race(TakeoverMode::CompareAndSwap, 16).await;

    let winners: Vec<_> = results.iter().filter(|(_, won)| *won).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(
        store.inner.get("seckill:1").await.unwrap().as_deref(),
        Some(winners[0].0.as_str())
    );
}

#[tokio::test]
async fn test_get_and_set_clobbers_the_winner() {
    let (store, results) = race(TakeoverMode::GetAndSet, 2).await;

    // Only one caller is told it won...
    let winners: Vec<_> = results.iter().filter(|(_, won)| *won).collect();
    assert_eq!(winners.len(), 1);

    // ...but the loser's swap replaced the winner's token.
    let stored = store.inner.get("seckill:1").await.unwrap().unwrap();
    assert_ne!(stored, winners[0].0);

    assert!(
        !store
            .inner
            .compare_and_delete("seckill:1", &winners[0].0)
            .await
            .unwrap()
    );
}
