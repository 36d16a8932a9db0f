//! Pool configuration options

use std::time::Duration;

/// Configuration for resource pool sizing and eviction
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_initial_capacity(5)
///     .with_max_capacity(20)
///     .with_idle_timeout(Duration::from_secs(300));
///
/// assert_eq!(config.initial_capacity, 5);
/// assert_eq!(config.max_capacity, 20);
/// assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfiguration {
    /// Working capacity the pool starts with
    pub initial_capacity: usize,

    /// Upper bound for the working capacity, fixed for the pool's lifetime
    pub max_capacity: usize,

    /// Close resources left idle longer than this; `None` disables eviction
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            initial_capacity: 10,
            max_capacity: 100,
            idle_timeout: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial working capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the maximum capacity
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Whether `0 < initial_capacity <= max_capacity`
    pub fn is_valid(&self) -> bool {
        self.initial_capacity > 0 && self.initial_capacity <= self.max_capacity
    }
}
