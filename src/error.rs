//! Error types for the tiercache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by [`CacheMap`](crate::cache_map::CacheMap)
//!   operations when the instance lock cannot be acquired within the
//!   configured timeout. A missing key is never an error.
//! - [`ConfigError`]: Returned when construction parameters are invalid
//!   (e.g. a zero concurrency level).
//! - [`InvariantError`]: Returned by `check_invariants` when the tier
//!   structure is internally inconsistent.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use tiercache::builder::CacheMapBuilder;
//! use tiercache::error::ConfigError;
//!
//! let bad = CacheMapBuilder::new().concurrency_level(0).try_build::<u32, u32>();
//! assert!(matches!(bad, Err(ConfigError::ZeroConcurrencyLevel)));
//!
//! let cache = CacheMapBuilder::new()
//!     .lock_timeout(Duration::from_millis(50))
//!     .build::<u32, u32>();
//! assert!(cache.get(&1).unwrap().is_none());
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Which side of the reader/writer lock an operation was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => f.write_str("shared"),
            LockMode::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Error returned by cache operations.
///
/// The cache never fails for domain reasons; only lock acquisition is
/// fallible. When an operation fails the cache is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The lock was not acquired within the configured timeout.
    #[error("{operation}: timed out after {timeout:?} waiting for the {mode} lock")]
    LockTimeout {
        operation: &'static str,
        mode: LockMode,
        timeout: Duration,
    },
}

impl CacheError {
    /// Returns `true` for lock-acquisition timeouts. Callers typically retry
    /// or bypass the cache for the current request.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, CacheError::LockTimeout { .. })
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheMapBuilder::try_build`](crate::builder::CacheMapBuilder::try_build)
/// and [`CacheMapConfig::validate`](crate::config::CacheMapConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("concurrency_level must be > 0")]
    ZeroConcurrencyLevel,
    #[error("soft_ttl must be > 0 when set")]
    ZeroSoftTtl,
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- CacheError -------------------------------------------------------

    #[test]
    fn lock_timeout_display_names_operation_and_mode() {
        let err = CacheError::LockTimeout {
            operation: "put",
            mode: LockMode::Exclusive,
            timeout: Duration::from_millis(5),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("put:"));
        assert!(msg.contains("exclusive"));
        assert!(msg.contains("5ms"));
        assert!(err.is_lock_timeout());
    }

    #[test]
    fn cache_error_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CacheError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_parameter() {
        assert_eq!(
            ConfigError::ZeroConcurrencyLevel.to_string(),
            "concurrency_level must be > 0"
        );
        assert!(ConfigError::ZeroSoftTtl.to_string().contains("soft_ttl"));
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("primary over capacity");
        assert_eq!(err.to_string(), "primary over capacity");
        assert_eq!(err.message(), "primary over capacity");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
