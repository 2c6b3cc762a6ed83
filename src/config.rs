//! Construction parameters for [`CacheMap`](crate::cache_map::CacheMap).
//!
//! # Example
//!
//! ```
//! use tiercache::config::CacheMapConfig;
//!
//! // Defaults
//! let config = CacheMapConfig::default();
//! assert_eq!(config.cache_size, 1000);
//! assert!(!config.lru);
//!
//! // Partial override
//! let config = CacheMapConfig {
//!     lru: true,
//!     cache_size: 250,
//!     soft_reference_size: 189,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tier::EvictionOrder;

/// Configuration for a tiered cache.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheMapConfig {
    /// LRU ejection order for the primary tier (FIFO when `false`).
    #[serde(default)]
    pub lru: bool,

    /// Primary tier capacity in entries. `0` sends every unpinned entry
    /// straight to the soft tier.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Soft tier capacity in entries. `0` disables the soft tier.
    #[serde(default = "default_soft_reference_size")]
    pub soft_reference_size: usize,

    /// Maximum wait for the instance lock, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Expected number of concurrently active threads. Only used to size
    /// internal maps.
    #[serde(default = "default_concurrency_level")]
    pub concurrency_level: usize,

    /// Age after which a soft entry counts as reclaimed (disabled when unset).
    #[serde(default)]
    pub soft_ttl_ms: Option<u64>,
}

fn default_cache_size() -> usize { 1000 }
fn default_soft_reference_size() -> usize { 1000 }
fn default_lock_timeout_ms() -> u64 { 1000 }
fn default_concurrency_level() -> usize { 16 }

impl Default for CacheMapConfig {
    fn default() -> Self {
        Self {
            lru: false,
            cache_size: default_cache_size(),
            soft_reference_size: default_soft_reference_size(),
            lock_timeout_ms: default_lock_timeout_ms(),
            concurrency_level: default_concurrency_level(),
            soft_ttl_ms: None,
        }
    }
}

impl CacheMapConfig {
    /// Checks parameters that cannot be expressed by the field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_level == 0 {
            return Err(ConfigError::ZeroConcurrencyLevel);
        }
        if self.soft_ttl_ms == Some(0) {
            return Err(ConfigError::ZeroSoftTtl);
        }
        Ok(())
    }

    #[must_use]
    pub fn eviction_order(&self) -> EvictionOrder {
        EvictionOrder::from_lru_flag(self.lru)
    }

    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    #[must_use]
    pub fn soft_ttl(&self) -> Option<Duration> {
        self.soft_ttl_ms.map(Duration::from_millis)
    }

    /// Initial allocation hint for the tier maps.
    pub(crate) fn size_hint(&self) -> usize {
        self.concurrency_level.saturating_mul(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: CacheMapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheMapConfig::default());
        assert_eq!(config.eviction_order(), EvictionOrder::Fifo);
        assert_eq!(config.lock_timeout(), Duration::from_secs(1));
        assert_eq!(config.soft_ttl(), None);
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let config: CacheMapConfig = serde_json::from_str(
            r#"{ "lru": true, "cache_size": 0, "soft_reference_size": 1, "soft_ttl_ms": 250 }"#,
        )
        .unwrap();
        assert!(config.lru);
        assert_eq!(config.cache_size, 0);
        assert_eq!(config.soft_reference_size, 1);
        assert_eq!(config.concurrency_level, 16);
        assert_eq!(config.soft_ttl(), Some(Duration::from_millis(250)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let zero_level = CacheMapConfig {
            concurrency_level: 0,
            ..Default::default()
        };
        assert_eq!(zero_level.validate(), Err(ConfigError::ZeroConcurrencyLevel));

        let zero_ttl = CacheMapConfig {
            soft_ttl_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_ttl.validate(), Err(ConfigError::ZeroSoftTtl));
    }
}
