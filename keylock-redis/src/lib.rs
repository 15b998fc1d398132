//! # Keylock Redis
//!
//! Redis backend for `keylock` locks.
//!
//! ## Features
//!
//! - **Connection Pooling**: Efficient connection management with bb8
//! - **Atomic Scripts**: Compare-and-swap and compare-and-delete as Lua scripts
//! - **Native TTL**: Leases use `SET NX PX`
//! - **Bounded Commands**: Every store call is subject to a command timeout
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keylock_core::DistributedLock;
//! use keylock_redis::{RedisConfig, RedisStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .pool_size(10)
//!         .build();
//!
//!     let store = RedisStore::connect(config).await?;
//!     let lock = DistributedLock::new(Arc::new(store));
//!
//!     let token = lock.token_for(Duration::from_secs(10));
//!     if lock.acquire("seckill:1", &token).await? {
//!         // Critical section
//!         lock.release("seckill:1", &token).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod service;
mod store;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use service::{PoolStats, PooledRedis, RedisPool, RedisService};
pub use store::RedisStore;

// Re-export redis crate for convenience
pub use redis;
