use std::sync::atomic::{AtomicU64, Ordering};

/// A metrics-only counter.
///
/// Counters are bumped from both lock modes, so concurrent readers may record
/// at the same time. Relaxed ordering is enough: counters are observational
/// and never drive cache decisions.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(AtomicU64);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn concurrent_increments_are_not_lost() {
        let cell = Arc::new(MetricsCell::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        cell.incr();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.get(), 4000);

        cell.add(5);
        assert_eq!(cell.get(), 4005);
        cell.reset();
        assert_eq!(cell.get(), 0);
    }
}
