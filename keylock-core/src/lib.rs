//! Distributed mutual exclusion over a shared key-value store.
//!
//! Independent processes that share nothing but a key-value store can use
//! this crate to serialize a critical section, such as decrementing stock
//! during a flash sale.
//!
//! ## Features
//!
//! - **Deadline locks** - [`DistributedLock`] stores the holder's expiry
//!   deadline and lets any caller take over once it has passed
//! - **Leases** - [`LeaseLock`] relies on the store's own key TTL
//! - **Atomic takeover and release** - compare-and-swap and
//!   compare-and-delete, never check-then-act
//! - **In-memory store** - [`MemoryStore`] for tests and single-process use
//!
//! Every call is a single attempt. Waiting, retry and backoff are up to the
//! caller.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keylock_core::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LockError> {
//!     let lock = DistributedLock::new(Arc::new(MemoryStore::new()));
//!     let token = lock.token_for(Duration::from_secs(10));
//!
//!     if lock.acquire("seckill:1", &token).await? {
//!         // Critical section
//!         lock.release("seckill:1", &token).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod lease;
pub mod lock;
pub mod memory;
pub mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LockConfig, LockConfigBuilder, TakeoverMode};
pub use error::{LockError, LockResult, StoreError, StoreResult};
pub use lease::{LeaseGuard, LeaseLock};
pub use lock::{DistributedLock, LockState, ReleaseOutcome};
pub use memory::MemoryStore;
pub use store::KeyValueStore;
pub use token::Deadline;
