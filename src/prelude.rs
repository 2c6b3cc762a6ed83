pub use crate::builder::CacheMapBuilder;
pub use crate::cache_map::CacheMap;
pub use crate::config::CacheMapConfig;
pub use crate::error::{CacheError, ConfigError, InvariantError, LockMode};
pub use crate::listener::{EvictionListener, NoopListener};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CacheMapMetricsSnapshot;
pub use crate::reclaim::ReclaimHandle;
pub use crate::tier::EvictionOrder;
pub use crate::tiered::{CoreOptions, Lookup, Tier, TieredCore};
