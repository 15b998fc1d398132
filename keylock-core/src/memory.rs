//! In-process key-value store.

use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory [`KeyValueStore`] with the same atomicity as a real store.
///
/// Every operation runs under one mutex, so compare-and-swap and
/// compare-and-delete are indivisible. TTLs are measured with
/// [`tokio::time::Instant`] and evicted lazily, which lets tests drive
/// expiry with paused time.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    injected_failures: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` operations fail with a connection error.
    pub fn fail_next(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Check if the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_fault(&self) -> StoreResult<()> {
        let injected = self
            .injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(StoreError::Connection("injected failure".to_string())),
            Err(_) => Ok(()),
        }
    }

    /// Run `f` over the live entry for `key`, evicting it first if expired.
    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&mut Option<Entry>) -> T) -> StoreResult<T> {
        self.check_fault()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut slot = entries.remove(key).filter(|e| e.is_live(now));
        let result = f(&mut slot);
        if let Some(entry) = slot {
            entries.insert(key.to_string(), entry);
        }
        Ok(result)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        self.with_entry(key, |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(Entry {
                value: value.to_string(),
                expires_at: None,
            });
            true
        })
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.with_entry(key, |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            });
            true
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_entry(key, |slot| slot.as_ref().map(|e| e.value.clone()))
    }

    async fn get_and_set(&self, key: &str, value: &str) -> StoreResult<Option<String>> {
        self.with_entry(key, |slot| {
            // A plain SET clears any TTL.
            slot.replace(Entry {
                value: value.to_string(),
                expires_at: None,
            })
            .map(|old| old.value)
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.with_entry(key, |slot| {
            slot.take();
        })
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> StoreResult<bool> {
        self.with_entry(key, |slot| match slot {
            Some(entry) if entry.value == expected => {
                entry.value = new.to_string();
                entry.expires_at = None;
                true
            }
            _ => false,
        })
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> StoreResult<bool> {
        self.with_entry(key, |slot| {
            if slot.as_ref().is_some_and(|e| e.value == expected) {
                slot.take();
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_if_absent() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("k", "a").await.unwrap());
        assert!(!store.set_if_absent("k", "b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_get_and_set_returns_previous() {
        let store = MemoryStore::new();
        assert_eq!(store.get_and_set("k", "a").await.unwrap(), None);
        assert_eq!(store.get_and_set("k", "b").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();
        assert!(!store.compare_and_swap("k", "a", "b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set_if_absent("k", "a").await.unwrap();
        assert!(!store.compare_and_swap("k", "x", "b").await.unwrap());
        assert!(store.compare_and_swap("k", "a", "b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_compare_and_delete() {
        let store = MemoryStore::new();
        store.set_if_absent("k", "a").await.unwrap();

        assert!(!store.compare_and_delete("k", "b").await.unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.compare_and_delete("k", "a").await.unwrap());
        assert!(store.is_empty());
        assert!(!store.compare_and_delete("k", "a").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let store = MemoryStore::new();
        assert!(
            store
                .set_if_absent_with_ttl("k", "a", Duration::from_secs(5))
                .await
                .unwrap()
        );
        assert!(
            !store
                .set_if_absent_with_ttl("k", "b", Duration::from_secs(5))
                .await
                .unwrap()
        );

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(
            store
                .set_if_absent_with_ttl("k", "b", Duration::from_secs(5))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.fail_next(2);

        assert!(matches!(
            store.get("k").await,
            Err(StoreError::Connection(_))
        ));
        assert!(store.delete("k").await.is_err());
        assert!(store.set_if_absent("k", "a").await.unwrap());
    }
}
