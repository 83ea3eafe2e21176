//! Per-watcher debounce state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sentinel for "never fired"; the first event is always accepted.
const NEVER: u64 = u64::MAX;

/// Last-fire timestamp of one watcher.
///
/// The timestamp is stored as milliseconds since `origin` in an atomic, so
/// the check-and-update is a single compare-and-set even if events arrive on
/// several threads at once.
#[derive(Debug)]
pub struct DebounceState {
    origin: Instant,
    last_fire: AtomicU64,
    min_interval: Duration,
}

impl DebounceState {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            last_fire: AtomicU64::new(NEVER),
            min_interval,
        }
    }

    /// Accept an event now if the window since the last fire has elapsed.
    ///
    /// Accepting records the fire time, so of two racing callers exactly one
    /// wins.
    pub fn try_accept(&self) -> bool {
        self.try_accept_at(Instant::now())
    }

    pub(crate) fn try_accept_at(&self, now: Instant) -> bool {
        let now_ms = self.millis(now);
        let min_ms = duration_millis(self.min_interval);

        let mut last = self.last_fire.load(Ordering::Acquire);
        loop {
            if last != NEVER && now_ms.saturating_sub(last) < min_ms {
                return false;
            }
            match self.last_fire.compare_exchange_weak(
                last,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(current) => last = current,
            }
        }
    }

    /// Record a fire at the current time, regardless of the window.
    pub fn stamp(&self) {
        self.stamp_at(Instant::now());
    }

    pub(crate) fn stamp_at(&self, now: Instant) {
        self.last_fire.store(self.millis(now), Ordering::Release);
    }

    /// Time of the last fire, if any.
    #[cfg(test)]
    pub fn last_fire(&self) -> Option<Instant> {
        match self.last_fire.load(Ordering::Acquire) {
            NEVER => None,
            ms => Some(self.origin + Duration::from_millis(ms)),
        }
    }

    fn millis(&self, now: Instant) -> u64 {
        duration_millis(now.saturating_duration_since(self.origin))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_millis(d: Duration) -> u64 {
    // saturate below the sentinel
    d.as_millis().min(u128::from(NEVER - 1)) as u64
}
