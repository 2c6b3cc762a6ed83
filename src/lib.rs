//! tiercache: a bounded, thread-safe, multi-tier cache map.
//!
//! Entries live in one of three tiers:
//!
//! - **pinned**: unbounded, never evicted by capacity pressure
//! - **primary**: bounded, LRU or FIFO ejection
//! - **soft**: bounded overflow for primary victims; may be invalidated at
//!   any time through a [`ReclaimHandle`](reclaim::ReclaimHandle)
//!
//! Start with [`CacheMapBuilder`](builder::CacheMapBuilder).

pub mod builder;
pub mod cache_map;
pub mod config;
pub mod ds;
pub mod error;
pub mod listener;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod reclaim;
pub mod tier;
pub mod tiered;
