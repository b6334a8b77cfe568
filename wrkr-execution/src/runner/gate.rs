use std::time::Instant;

use crate::counter::Counter;

/// Decides whether another iteration may start.
#[derive(Debug)]
pub struct IterationGate {
    claimed: Counter,
    iterations: Option<u64>,
    deadline: Instant,
}

impl IterationGate {
    /// A gate admitting up to `iterations` claims (unbounded when `None`) until `deadline`.
    pub fn new(iterations: Option<u64>, deadline: Instant) -> Self {
        Self {
            claimed: Counter::default(),
            iterations,
            deadline,
        }
    }

    pub fn next(&self) -> bool {
        if Instant::now() >= self.deadline {
            return false;
        }

        match self.iterations {
            Some(total) => self.claimed.next() < total,
            None => {
                self.claimed.incr();
                true
            }
        }
    }

    /// Iterations admitted so far.
    pub fn admitted(&self) -> u64 {
        let claimed = self.claimed.get();
        self.iterations.map_or(claimed, |total| claimed.min(total))
    }
}
