//! The three storage tiers composed by [`TieredCore`](crate::tiered::TieredCore).
//!
//! | Tier     | Bound                 | Leaves via                               |
//! |----------|-----------------------|------------------------------------------|
//! | pinned   | unbounded             | `unpin`, `remove`, `clear`               |
//! | primary  | `cache_size`          | overflow to soft, `pin`, `remove`        |
//! | soft     | `soft_reference_size` | overflow, reclaim/TTL, promotion, `pin`  |
//!
//! None of these types lock; the owning cache serializes access.

pub mod pinned;
pub mod primary;
pub mod soft;

pub use primary::EvictionOrder;
