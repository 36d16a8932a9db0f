//! Core resource pool implementation

use crate::atomic::{AtomicCounter, AtomicDuration};
use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::slots::{Slot, SlotQueue};
use crate::stats::PoolStats;
use crate::timer::PeriodicTask;

use std::error::Error;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// An expensive, closable resource such as a network connection
///
/// The pool calls [`close`](Resource::close) at most once per resource: on
/// idle eviction, on a capacity shrink, or when the pool is closed or
/// dropped. `close` must not call back into the pool that owns the resource.
pub trait Resource: Send + 'static {
    /// Release whatever the resource holds
    fn close(self);
}

type BoxError = Box<dyn Error + Send + Sync>;
type Factory<R> = Box<dyn Fn() -> Result<R, BoxError> + Send + Sync>;

struct Shared<R> {
    slots: SlotQueue<R>,
    factory: Factory<R>,
    capacity: AtomicCounter,
    idle_timeout: AtomicDuration,
    available: AtomicCounter,
    active: AtomicCounter,
    in_use: AtomicCounter,
    wait_count: AtomicCounter,
    wait_time: AtomicDuration,
    idle_closed: AtomicCounter,
}

impl<R: Resource> Shared<R> {
    /// Close the resource held by `slot`, if any
    fn retire(&self, slot: Slot<R>) {
        if let Slot::Idle { resource, .. } = slot {
            resource.close();
            self.active.add(-1);
        }
    }

    /// One eviction sweep. Only looks at slots it can take without waiting;
    /// checked-out slots are picked up by a later sweep.
    fn close_idle_resources(&self) {
        let timeout = self.idle_timeout.get();
        if timeout.is_zero() {
            return;
        }

        let mut closed = 0;
        for _ in 0..self.capacity.get() {
            let Some(slot) = self.slots.try_pop() else {
                break;
            };

            let slot = if slot.is_idle_longer_than(timeout) {
                self.retire(slot);
                self.idle_closed.add(1);
                closed += 1;
                Slot::Empty
            } else {
                slot
            };
            self.slots.push(slot);
        }

        if closed > 0 {
            tracing::debug!(closed, ?timeout, "closed idle resources");
        }
    }
}

fn count(counter: &AtomicCounter) -> usize {
    usize::try_from(counter.get()).unwrap_or(0)
}

/// Bounded pool of lazily created resources
///
/// The pool starts with `initial_capacity` empty slots; a resource is only
/// created by the factory when [`get`](Self::get) takes a slot that has none.
/// Working capacity can move anywhere in `0..=max_capacity` at runtime, and
/// reaching zero closes the pool for good.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{Resource, ResourcePool};
/// use std::io;
/// use std::time::Duration;
///
/// struct Connection {
///     addr: String,
/// }
///
/// impl Resource for Connection {
///     fn close(self) {}
/// }
///
/// let pool = ResourcePool::new(
///     || Ok::<_, io::Error>(Connection { addr: "127.0.0.1:5432".into() }),
///     2,
///     8,
///     Duration::from_secs(60),
/// );
///
/// {
///     let conn = pool.acquire().unwrap();
///     assert_eq!(conn.addr, "127.0.0.1:5432");
///     assert_eq!(pool.in_use(), 1);
///     // Returned to the pool when `conn` goes out of scope
/// }
///
/// assert_eq!(pool.available(), 2);
/// assert_eq!(pool.active(), 1);
///
/// pool.set_capacity(4).unwrap();
/// assert_eq!(pool.available(), 4);
///
/// pool.close();
/// assert!(pool.get().is_err());
/// ```
pub struct ResourcePool<R: Resource> {
    shared: Arc<Shared<R>>,
    idle_timer: PeriodicTask,
}

impl<R: Resource> ResourcePool<R> {
    /// Create a pool with `initial_capacity` empty slots
    ///
    /// A non-zero `idle_timeout` starts a background sweep every
    /// `idle_timeout / 10` that closes resources idle for longer than that.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < initial_capacity <= max_capacity`.
    pub fn new<F, E>(
        factory: F,
        initial_capacity: usize,
        max_capacity: usize,
        idle_timeout: Duration,
    ) -> Self
    where
        F: Fn() -> Result<R, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        assert!(
            initial_capacity > 0 && initial_capacity <= max_capacity,
            "invalid capacity {initial_capacity} or max capacity {max_capacity}"
        );

        let slots = SlotQueue::new(max_capacity);
        for _ in 0..initial_capacity {
            slots.push(Slot::Empty);
        }

        let factory: Factory<R> = Box::new(move || factory().map_err(Into::<BoxError>::into));
        let shared = Arc::new(Shared {
            slots,
            factory,
            capacity: AtomicCounter::new(initial_capacity as i64),
            idle_timeout: AtomicDuration::new(idle_timeout),
            available: AtomicCounter::new(initial_capacity as i64),
            active: AtomicCounter::default(),
            in_use: AtomicCounter::default(),
            wait_count: AtomicCounter::default(),
            wait_time: AtomicDuration::default(),
            idle_closed: AtomicCounter::default(),
        });

        let pool = Self {
            shared,
            idle_timer: PeriodicTask::new(idle_timeout / 10),
        };
        if !idle_timeout.is_zero() {
            pool.start_eviction();
        }
        pool
    }

    /// Create a pool from a [`PoolConfiguration`]
    ///
    /// # Panics
    ///
    /// Panics if the configuration is not [valid](PoolConfiguration::is_valid).
    pub fn with_config<F, E>(factory: F, config: PoolConfiguration) -> Self
    where
        F: Fn() -> Result<R, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::new(
            factory,
            config.initial_capacity,
            config.max_capacity,
            config.idle_timeout.unwrap_or(Duration::ZERO),
        )
    }

    fn start_eviction(&self) {
        let shared: Weak<Shared<R>> = Arc::downgrade(&self.shared);
        self.idle_timer.start(move || {
            if let Some(shared) = shared.upgrade() {
                shared.close_idle_resources();
            }
        });
    }

    /// Take a resource, creating it if the slot is empty
    ///
    /// Blocks until a slot is free or the pool is closed. A factory error is
    /// returned as [`PoolError::Factory`] and leaves the slot in the pool; a
    /// factory panic also leaves the slot in the pool before propagating.
    pub fn get(&self) -> PoolResult<R> {
        let shared = &self.shared;

        let slot = match shared.slots.try_pop() {
            Some(slot) => slot,
            None => {
                if shared.slots.is_closed() {
                    return Err(PoolError::Closed);
                }
                let started = Instant::now();
                let slot = shared.slots.pop();
                shared.wait_count.add(1);
                shared.wait_time.add(started.elapsed());
                slot.ok_or(PoolError::Closed)?
            }
        };

        let resource = match slot {
            Slot::Idle { resource, .. } => resource,
            Slot::Empty => match panic::catch_unwind(AssertUnwindSafe(|| (shared.factory)())) {
                Ok(Ok(resource)) => {
                    shared.active.add(1);
                    tracing::trace!("created pooled resource");
                    resource
                }
                Ok(Err(err)) => {
                    shared.slots.push(Slot::Empty);
                    tracing::debug!(error = %err, "resource factory failed");
                    return Err(PoolError::Factory(Arc::from(err)));
                }
                Err(payload) => {
                    // The slot must outlive the panic or capacity leaks.
                    shared.slots.push(Slot::Empty);
                    tracing::error!("resource factory panicked");
                    panic::resume_unwind(payload);
                }
            },
        };

        shared.in_use.add(1);
        shared.available.add(-1);
        Ok(resource)
    }

    /// Like [`get`](Self::get), wrapped in a guard that puts the resource
    /// back when dropped
    pub fn acquire(&self) -> PoolResult<PooledResource<'_, R>> {
        let resource = self.get()?;
        Ok(PooledResource {
            pool: self,
            resource: Some(resource),
        })
    }

    /// [`get`](Self::get) on tokio's blocking thread pool
    ///
    /// If the returned future is dropped before completion, a resource
    /// acquired in the meantime is put straight back.
    pub async fn get_async(self: &Arc<Self>) -> PoolResult<R> {
        let pool = Arc::clone(self);
        let (sender, receiver) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let acquired = pool.get();
            if let Err(Ok(resource)) = sender.send(acquired) {
                pool.put(Some(resource));
            }
        });

        receiver.await.map_err(|_| PoolError::AcquireAborted)?
    }

    /// Return a resource taken with [`get`](Self::get)
    ///
    /// `None` discards a broken resource: the slot comes back empty and a new
    /// resource is created on a later `get`. The caller is responsible for
    /// closing the discarded resource.
    ///
    /// # Panics
    ///
    /// Panics when there is no matching outstanding `get`, which shows up as
    /// a full or closed pool.
    pub fn put(&self, resource: Option<R>) {
        let shared = &self.shared;
        assert!(
            !shared.slots.is_closed(),
            "put a resource into a closed resource pool"
        );

        let slot = match resource {
            Some(resource) => Slot::idle(resource),
            None => {
                shared.active.add(-1);
                tracing::debug!("discarded pooled resource");
                Slot::Empty
            }
        };

        if shared.slots.try_push(slot).is_err() {
            panic!("put a resource into a full resource pool");
        }

        shared.in_use.add(-1);
        shared.available.add(1);
    }

    /// Change the working capacity
    ///
    /// Growing adds empty slots. Shrinking removes slots, closing their
    /// resources, and blocks until enough slots have been returned by their
    /// holders. Shrinking to zero closes the pool and fails every pending
    /// `get` with [`PoolError::Closed`].
    pub fn set_capacity(&self, capacity: usize) -> PoolResult<()> {
        let shared = &self.shared;
        let max = shared.slots.bound();
        if capacity > max {
            return Err(PoolError::CapacityOutOfRange {
                requested: capacity,
                max,
            });
        }

        let new = capacity as i64;
        let old = loop {
            let old = shared.capacity.get();
            if old == 0 {
                return Err(PoolError::Closed);
            }
            if old == new {
                return Ok(());
            }
            if shared.capacity.compare_and_swap(old, new) {
                break old;
            }
        };

        if new > old {
            for _ in old..new {
                shared.slots.push(Slot::Empty);
                shared.available.add(1);
            }
        } else {
            for _ in new..old {
                // `None` only when a concurrent shrink already closed the pool.
                let Some(slot) = shared.slots.pop() else {
                    break;
                };
                shared.retire(slot);
                shared.available.add(-1);
            }
        }

        if new == 0 {
            shared.slots.close();
            self.idle_timer.stop();
        }
        tracing::debug!(old, new, queued = shared.slots.len(), "resource pool capacity changed");
        Ok(())
    }

    /// Change the idle timeout and retune the eviction sweep to a tenth of it
    ///
    /// A zero timeout stops eviction.
    pub fn set_idle_timeout(&self, timeout: Duration) -> PoolResult<()> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        self.shared.idle_timeout.set(timeout);
        self.idle_timer.set_interval(timeout / 10);
        if timeout.is_zero() {
            self.idle_timer.stop();
        } else {
            self.start_eviction();
            self.idle_timer.reset();
        }
        Ok(())
    }

    /// Stop eviction and shrink to zero, closing every resource
    ///
    /// Blocks until all checked-out resources are returned, so it must not
    /// be called while the calling thread still holds one. Idempotent.
    pub fn close(&self) {
        self.idle_timer.stop();
        if self.set_capacity(0).is_ok() {
            tracing::debug!("resource pool closed");
        }
    }

    /// Whether the pool has reached capacity zero
    pub fn is_closed(&self) -> bool {
        self.shared.capacity.get() == 0
    }

    /// Working capacity
    pub fn capacity(&self) -> usize {
        count(&self.shared.capacity)
    }

    /// Capacity ceiling fixed at construction
    pub fn max_capacity(&self) -> usize {
        self.shared.slots.bound()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.shared.idle_timeout.get()
    }

    /// Slots currently queued in the pool
    pub fn available(&self) -> usize {
        count(&self.shared.available)
    }

    /// Slots holding a live resource, idle or checked out
    pub fn active(&self) -> usize {
        count(&self.shared.active)
    }

    /// Slots checked out by callers
    pub fn in_use(&self) -> usize {
        count(&self.shared.in_use)
    }

    /// Number of `get` calls that had to block
    pub fn wait_count(&self) -> u64 {
        u64::try_from(self.shared.wait_count.get()).unwrap_or(0)
    }

    /// Total time spent blocked in `get`
    pub fn wait_time(&self) -> Duration {
        self.shared.wait_time.get()
    }

    /// Resources closed by idle eviction
    pub fn idle_closed(&self) -> u64 {
        u64::try_from(self.shared.idle_closed.get()).unwrap_or(0)
    }

    /// Snapshot of all counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            max_capacity: self.max_capacity(),
            idle_timeout: self.idle_timeout(),
            available: self.available(),
            active: self.active(),
            in_use: self.in_use(),
            wait_count: self.wait_count(),
            wait_time: self.wait_time(),
            idle_closed: self.idle_closed(),
        }
    }
}

impl<R: Resource> Drop for ResourcePool<R> {
    fn drop(&mut self) {
        self.idle_timer.stop();
        while let Some(slot) = self.shared.slots.try_pop() {
            self.shared.retire(slot);
        }
    }
}

/// A checked-out resource that goes back to its pool when dropped
pub struct PooledResource<'a, R: Resource> {
    pool: &'a ResourcePool<R>,
    resource: Option<R>,
}

impl<R: Resource> PooledResource<'_, R> {
    /// Close a broken resource and free its slot for a fresh one
    pub fn discard(mut self) {
        if let Some(resource) = self.resource.take() {
            resource.close();
            self.pool.put(None);
        }
    }

    /// Detach the resource from the guard; the caller then owes the pool a
    /// [`put`](ResourcePool::put)
    pub fn into_inner(mut self) -> R {
        self.resource.take().expect("Resource already taken")
    }
}

impl<R: Resource> Deref for PooledResource<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        self.resource.as_ref().expect("Resource already taken")
    }
}

impl<R: Resource> DerefMut for PooledResource<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resource.as_mut().expect("Resource already taken")
    }
}

impl<R: Resource> Drop for PooledResource<'_, R> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.put(Some(resource));
        }
    }
}
