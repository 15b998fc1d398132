// Keylock - mutual exclusion for processes that share only a key-value store
//
// Re-exports the lock primitives and, with the `redis` feature, the Redis
// backend.

pub use keylock_core::*;

#[cfg(feature = "redis")]
pub use keylock_redis;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Clock, Deadline, DistributedLock, KeyValueStore, LeaseGuard, LeaseLock, LockConfig,
        LockError, LockResult, LockState, MemoryStore, ReleaseOutcome, StoreError, SystemClock,
        TakeoverMode,
    };

    #[cfg(feature = "redis")]
    pub use keylock_redis::{RedisConfig, RedisStore};
}
