//! Lock-free scalar cells shared between pool callers and the eviction task

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Atomic signed counter
///
/// Every operation is linearizable on its own cell. Nothing orders one
/// counter relative to another, so a group of counters read one after the
/// other is only an eventually-consistent snapshot.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::AtomicCounter;
///
/// let counter = AtomicCounter::new(233);
/// assert_eq!(counter.add(2100), 2333);
/// assert!(counter.compare_and_swap(2333, 1234));
/// assert_eq!(counter.get(), 1234);
/// ```
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicI64);

impl AtomicCounter {
    /// Create a counter holding `value`
    pub const fn new(value: i64) -> Self {
        Self(AtomicI64::new(value))
    }

    /// Current value
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Overwrite the value
    pub fn set(&self, value: i64) {
        self.0.store(value, Ordering::SeqCst);
    }

    /// Add `delta` (which may be negative) and return the new value
    pub fn add(&self, delta: i64) -> i64 {
        self.0.fetch_add(delta, Ordering::SeqCst).wrapping_add(delta)
    }

    /// Store `new` only if the cell still holds `old`
    pub fn compare_and_swap(&self, old: i64, new: i64) -> bool {
        self.0
            .compare_exchange(old, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Atomic time span with the same operation set as [`AtomicCounter`]
///
/// Stored as whole nanoseconds, saturating at `u64::MAX` (about 584 years).
#[derive(Debug, Default)]
pub struct AtomicDuration(AtomicU64);

impl AtomicDuration {
    /// Create a cell holding `value`
    pub fn new(value: Duration) -> Self {
        Self(AtomicU64::new(to_nanos(value)))
    }

    /// Current value
    pub fn get(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::SeqCst))
    }

    /// Overwrite the value
    pub fn set(&self, value: Duration) {
        self.0.store(to_nanos(value), Ordering::SeqCst);
    }

    /// Add `delta` and return the new value
    pub fn add(&self, delta: Duration) -> Duration {
        let delta = to_nanos(delta);
        let previous = self.0.fetch_add(delta, Ordering::SeqCst);
        Duration::from_nanos(previous.wrapping_add(delta))
    }

    /// Store `new` only if the cell still holds `old`
    pub fn compare_and_swap(&self, old: Duration, new: Duration) -> bool {
        self.0
            .compare_exchange(to_nanos(old), to_nanos(new), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

fn to_nanos(value: Duration) -> u64 {
    u64::try_from(value.as_nanos()).unwrap_or(u64::MAX)
}
