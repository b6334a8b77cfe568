use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter shared between VUs.
///
/// Every operation is a single atomic instruction: callers never block and a read
/// always observes a value the counter actually held.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub const fn new(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }

    /// Claims the current value and advances the counter by one.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Claims the current value and advances the counter by `step`.
    pub fn next_by(&self, step: u64) -> u64 {
        self.0.fetch_add(step, Ordering::Relaxed)
    }

    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Gauge kept within `[0, max]`.
#[derive(Debug)]
pub struct BoundedGauge {
    value: AtomicU64,
    max: u64,
}

impl BoundedGauge {
    pub const fn new(max: u64) -> Self {
        Self {
            value: AtomicU64::new(0),
            max,
        }
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Increments the gauge unless it is already at `max`.
    pub fn try_incr(&self) -> bool {
        let max = self.max;
        self.value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                (cur < max).then_some(cur + 1)
            })
            .is_ok()
    }

    /// Applies `delta` (saturating at both bounds) and returns the new value.
    pub fn adjust(&self, delta: i64) -> u64 {
        let max = self.max;
        let apply = move |cur: u64| -> u64 {
            if delta >= 0 {
                cur.saturating_add(delta.unsigned_abs()).min(max)
            } else {
                cur.saturating_sub(delta.unsigned_abs())
            }
        };

        let prev = match self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| Some(apply(cur)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        apply(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn counter_next_returns_value_before_increment() {
        let c = Counter::new(5);
        assert_eq!(c.next(), 5);
        assert_eq!(c.next(), 6);
        assert_eq!(c.next_by(10), 7);
        assert_eq!(c.get(), 17);
    }

    #[test]
    fn counter_claims_are_dense_across_threads() {
        let c = Arc::new(Counter::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || (0..1000).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = BTreeSet::new();
        for h in handles {
            let claimed = h
                .join()
                .unwrap_or_else(|_| panic!("counter thread panicked"));
            for v in claimed {
                assert!(seen.insert(v), "value {v} claimed twice");
            }
        }

        assert_eq!(seen.len(), 8000);
        assert_eq!(seen.first().copied(), Some(0));
        assert_eq!(seen.last().copied(), Some(7999));
    }

    #[test]
    fn gauge_saturates_at_bounds() {
        let g = BoundedGauge::new(3);
        assert_eq!(g.adjust(2), 2);
        assert_eq!(g.adjust(5), 3);
        assert_eq!(g.adjust(-1), 2);
        assert_eq!(g.adjust(-10), 0);
        assert_eq!(g.get(), 0);
        assert_eq!(g.max(), 3);
    }

    #[test]
    fn gauge_try_incr_stops_at_max() {
        let g = BoundedGauge::new(2);
        assert!(g.try_incr());
        assert!(g.try_incr());
        assert!(!g.try_incr());
        assert_eq!(g.get(), 2);
    }
}
