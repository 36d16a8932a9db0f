//! Point-in-time statistics for a resource pool

use std::time::Duration;

/// Snapshot of every pool counter
///
/// Counters are read one at a time while the pool keeps running, so a
/// snapshot taken under load may be momentarily inconsistent
/// (e.g. `available + in_use` off by one from `capacity`).
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{Resource, ResourcePool};
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// struct Conn;
/// impl Resource for Conn {
///     fn close(self) {}
/// }
///
/// let pool = ResourcePool::new(|| Ok::<_, Infallible>(Conn), 4, 8, Duration::ZERO);
/// let conn = pool.get().unwrap();
///
/// let stats = pool.stats();
/// assert_eq!(stats.in_use, 1);
/// assert_eq!(stats.available, 3);
/// assert_eq!(stats.utilization(), 0.25);
///
/// pool.put(Some(conn));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolStats {
    /// Working capacity
    pub capacity: usize,

    /// Capacity ceiling fixed at construction
    pub max_capacity: usize,

    /// Idle timeout; zero when eviction is disabled
    pub idle_timeout: Duration,

    /// Slots currently queued
    pub available: usize,

    /// Slots holding a live resource
    pub active: usize,

    /// Slots checked out by callers
    pub in_use: usize,

    /// Number of `get` calls that had to block
    pub wait_count: u64,

    /// Total time spent blocked in `get`
    pub wait_time: Duration,

    /// Resources closed by idle eviction
    pub idle_closed: u64,
}

impl PoolStats {
    /// Fraction of working capacity checked out (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0 {
            self.in_use as f64 / self.capacity as f64
        } else {
            0.0
        }
    }
}
