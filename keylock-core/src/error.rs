//! Lock and store error types.

use thiserror::Error;

/// Result type for key-value store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for lock operations.
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Failures talking to the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection dropped.
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The store did not answer in time.
    #[error("Store operation timed out")]
    Timeout,

    /// The store answered with an error.
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// Distributed lock errors.
///
/// A busy lock is not an error: acquisition reports it as `Ok(false)` or
/// `Ok(None)`. Only infrastructure and input problems end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed lock token: {0:?}")]
    MalformedToken(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LockError {
    /// Check if this error came from the store rather than from the caller.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
