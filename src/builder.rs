//! Fluent construction of [`CacheMap`] instances.
//!
//! Every parameter starts at the [`CacheMapConfig`] default; override only
//! what differs.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use tiercache::builder::CacheMapBuilder;
//!
//! let cache = CacheMapBuilder::new()
//!     .lru(true)
//!     .cache_size(250)
//!     .soft_reference_size(189)
//!     .lock_timeout(Duration::from_millis(200))
//!     .build::<u64, String>();
//!
//! assert!(cache.is_lru());
//! assert_eq!(cache.cache_size().unwrap(), 250);
//! ```

use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::cache_map::CacheMap;
use crate::config::CacheMapConfig;
use crate::error::ConfigError;

/// Builder for [`CacheMap`].
#[derive(Debug, Clone, Default)]
pub struct CacheMapBuilder {
    config: CacheMapConfig,
}

impl CacheMapBuilder {
    /// Creates a builder with default parameters (FIFO, 1000/1000 entries,
    /// 1s lock timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one read from a file.
    pub fn from_config(config: CacheMapConfig) -> Self {
        Self { config }
    }

    /// LRU ejection order when `true`, FIFO otherwise.
    pub fn lru(mut self, lru: bool) -> Self {
        self.config.lru = lru;
        self
    }

    /// Primary tier capacity.
    pub fn cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Soft tier capacity. `0` disables the soft tier.
    pub fn soft_reference_size(mut self, soft_reference_size: usize) -> Self {
        self.config.soft_reference_size = soft_reference_size;
        self
    }

    /// Maximum time any operation waits for the instance lock, rounded up to
    /// whole milliseconds.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout_ms = millis_ceil(timeout);
        self
    }

    /// Expected number of concurrently active threads.
    pub fn concurrency_level(mut self, concurrency_level: usize) -> Self {
        self.config.concurrency_level = concurrency_level;
        self
    }

    /// Soft entries older than `ttl` count as reclaimed. Rounded up to whole
    /// milliseconds.
    pub fn soft_ttl(mut self, ttl: Duration) -> Self {
        self.config.soft_ttl_ms = Some(millis_ceil(ttl));
        self
    }

    /// Configuration accumulated so far.
    pub fn config(&self) -> &CacheMapConfig {
        &self.config
    }

    /// Builds the cache.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (zero concurrency level, zero
    /// soft TTL). For a non-panicking alternative, use
    /// [`try_build`](Self::try_build).
    pub fn build<K, V>(self) -> CacheMap<K, V>
    where
        K: Eq + Hash + Clone + Send + Sync,
        V: Send + Sync,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the cache, returning an error on invalid parameters instead of
    /// panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if [`CacheMapConfig::validate`] rejects the
    /// configuration.
    pub fn try_build<K, V>(self) -> Result<CacheMap<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone + Send + Sync,
        V: Send + Sync,
    {
        self.config.validate()?;
        debug!(
            lru = self.config.lru,
            cache_size = self.config.cache_size,
            soft_reference_size = self.config.soft_reference_size,
            lock_timeout_ms = self.config.lock_timeout_ms,
            "building cache map"
        );
        Ok(CacheMap::from_config(&self.config))
    }
}

fn millis_ceil(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}
