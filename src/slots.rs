//! Capacity slots and the bounded queue that holds the idle ones

use crossbeam::channel::{self, Receiver, Sender, TryRecvError, select};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// One unit of pool capacity
pub(crate) enum Slot<R> {
    /// Capacity with no resource behind it yet
    Empty,
    /// A live resource and the instant it was last released
    Idle { resource: R, since: Instant },
}

impl<R> Slot<R> {
    pub fn idle(resource: R) -> Self {
        Slot::Idle {
            resource,
            since: Instant::now(),
        }
    }

    /// Whether this slot holds a resource released more than `timeout` ago
    pub fn is_idle_longer_than(&self, timeout: Duration) -> bool {
        match self {
            Slot::Empty => false,
            Slot::Idle { since, .. } => since.elapsed() > timeout,
        }
    }
}

/// Bounded FIFO of slots with blocking pop and a one-way close
///
/// Closing wakes every blocked [`pop`](Self::pop) with `None`, and every
/// later `pop` fails the same way.
pub(crate) struct SlotQueue<R> {
    sender: Sender<Slot<R>>,
    receiver: Receiver<Slot<R>>,
    // Nothing is ever sent on this channel; dropping the sender disconnects
    // `closed`, which makes it permanently ready.
    shutdown: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
    bound: usize,
}

impl<R> SlotQueue<R> {
    pub fn new(bound: usize) -> Self {
        let (sender, receiver) = channel::bounded(bound);
        let (shutdown, closed) = channel::bounded(0);
        Self {
            sender,
            receiver,
            shutdown: Mutex::new(Some(shutdown)),
            closed,
            bound,
        }
    }

    /// Take a slot if one is queued right now
    pub fn try_pop(&self) -> Option<Slot<R>> {
        self.receiver.try_recv().ok()
    }

    /// Take a slot, waiting as long as it takes. `None` once closed.
    pub fn pop(&self) -> Option<Slot<R>> {
        select! {
            recv(self.receiver) -> slot => slot.ok(),
            recv(self.closed) -> _ => None,
        }
    }

    /// Queue a slot without waiting, handing it back if the queue is full
    pub fn try_push(&self, slot: Slot<R>) -> Result<(), Slot<R>> {
        self.sender.try_send(slot).map_err(|err| err.into_inner())
    }

    /// Queue a slot, waiting for room if the queue is full
    pub fn push(&self, slot: Slot<R>) {
        // The queue owns its receiver, so the channel never disconnects.
        let _ = self.sender.send(slot);
    }

    pub fn close(&self) {
        self.shutdown.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.closed.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Number of slots physically queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Fixed upper bound on queued slots
    pub fn bound(&self) -> usize {
        self.bound
    }
}
