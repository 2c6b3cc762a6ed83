//! Observational counters for [`CacheMap`](crate::cache_map::CacheMap).
//!
//! Compiled only with the `metrics` feature (enabled by default).

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
