//! # EsoxSolutions.ResourcePool
//!
//! Bounded, thread-safe pool of expensive-to-create resources such as
//! network connections, shared across any number of threads.
//!
//! ## Features
//!
//! - Blocking `get`/`put` on a bounded queue, with no pool-wide lock on the hot path
//! - Lazy creation: capacity is reserved up front, resources are built on first use
//! - Runtime resizing between zero and a fixed maximum
//! - Idle-timeout eviction on a background sweep
//! - RAII guards that return resources automatically (Drop trait)
//! - Async acquisition on tokio's blocking pool
//! - Lock-free counters for wait and usage statistics
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::{Resource, ResourcePool};
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! struct Session(u32);
//!
//! impl Resource for Session {
//!     fn close(self) {
//!         println!("closing session {}", self.0);
//!     }
//! }
//!
//! let pool = ResourcePool::new(|| Ok::<_, Infallible>(Session(7)), 1, 4, Duration::from_secs(30));
//! {
//!     let session = pool.acquire().unwrap();
//!     println!("Got session {}", session.0);
//!     // Session automatically returned when `session` goes out of scope
//! }
//! assert_eq!(pool.active(), 1);
//! ```

mod atomic;
mod config;
mod errors;
mod pool;
mod slots;
mod stats;
mod timer;

pub use atomic::{AtomicCounter, AtomicDuration};
pub use config::PoolConfiguration;
pub use errors::{FactoryError, PoolError, PoolResult};
pub use pool::{PooledResource, Resource, ResourcePool};
pub use stats::PoolStats;
pub use timer::PeriodicTask;
