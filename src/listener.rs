//! Hooks for observing tier transitions.
//!
//! Listeners run while the cache's exclusive lock is held. They must be quick
//! and must not call back into the same cache instance.

use std::sync::Arc;

/// Receives notifications when entries leave a tier without an explicit
/// `remove`. Every method defaults to a no-op.
pub trait EvictionListener<K, V>: Send + Sync {
    /// An entry was pushed out of the primary tier by capacity pressure.
    ///
    /// `demoted` is `true` when the entry was handed to the soft tier and
    /// `false` when the soft tier is disabled and the entry was dropped.
    fn on_primary_overflow(&self, _key: &K, _value: &Arc<V>, _demoted: bool) {}

    /// The soft tier was full and dropped its oldest-demoted entry.
    fn on_soft_overflow(&self, _key: &K, _value: &Arc<V>) {}

    /// A reclaimed or expired soft entry was purged.
    fn on_soft_reclaimed(&self, _key: &K) {}
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl<K, V> EvictionListener<K, V> for NoopListener {}

pub(crate) type SharedListener<K, V> = Arc<dyn EvictionListener<K, V>>;
