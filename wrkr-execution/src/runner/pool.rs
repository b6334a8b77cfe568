use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::vu::VuState;

/// An initialized VU: its shared identity plus its script runtime.
#[derive(Debug)]
pub struct PooledVu<V> {
    pub state: Arc<VuState>,
    pub runtime: V,
}

/// Idle VUs waiting for a scenario.
#[derive(Debug)]
pub struct VuPool<V> {
    idle: Mutex<BTreeMap<u64, PooledVu<V>>>,
    released: Notify,
}

impl<V> VuPool<V> {
    pub fn new(vus: impl IntoIterator<Item = PooledVu<V>>) -> Self {
        let idle = vus
            .into_iter()
            .map(|vu| (vu.state.id().local, vu))
            .collect();
        Self {
            idle: Mutex::new(idle),
            released: Notify::new(),
        }
    }

    /// Takes the idle VU with the lowest id.
    pub fn acquire(&self) -> Option<PooledVu<V>> {
        self.idle.lock().pop_first().map(|(_, vu)| vu)
    }

    /// Takes `n` VUs, or none at all if fewer are idle.
    pub fn try_acquire_many(&self, n: u64) -> Option<Vec<PooledVu<V>>> {
        let mut idle = self.idle.lock();
        if (idle.len() as u64) < n {
            return None;
        }
        Some((0..n).filter_map(|_| idle.pop_first().map(|(_, vu)| vu)).collect())
    }

    /// Takes `n` VUs, waiting up to `wait` for busy ones to be released.
    ///
    /// A scenario may start the moment the previous one stops; its VUs come back
    /// only once their last iteration has been joined.
    pub async fn acquire_many(&self, n: u64, wait: Duration) -> Option<Vec<PooledVu<V>>> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let mut released = std::pin::pin!(self.released.notified());
            released.as_mut().enable();

            if let Some(vus) = self.try_acquire_many(n) {
                return Some(vus);
            }
            if tokio::time::timeout_at(deadline, released).await.is_err() {
                return None;
            }
        }
    }

    pub fn release(&self, vu: PooledVu<V>) {
        self.idle.lock().insert(vu.state.id().local, vu);
        self.released.notify_waiters();
    }

    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}
