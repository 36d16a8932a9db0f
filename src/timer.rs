//! Background task that invokes a callback on an adjustable interval

use crate::atomic::AtomicDuration;

use crossbeam::channel::{self, Receiver, Sender, after, never, select};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Stop,
    Reset,
    Trigger,
}

struct Worker {
    control: Sender<Control>,
    handle: JoinHandle<()>,
}

/// Runs a callback on a single background thread every `interval`
///
/// The interval may change while the task runs; the loop picks the new value
/// up the next time it computes a deadline, i.e. after the next firing or
/// after an explicit [`reset`](Self::reset). A zero interval disables firing
/// while keeping the task stoppable.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::PeriodicTask;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let task = PeriodicTask::new(Duration::from_millis(5));
///
/// let counter = Arc::clone(&ticks);
/// task.start(move || {
///     counter.fetch_add(1, Ordering::Relaxed);
/// });
/// std::thread::sleep(Duration::from_millis(50));
/// task.stop();
///
/// let seen = ticks.load(Ordering::Relaxed);
/// assert!(seen > 0);
/// std::thread::sleep(Duration::from_millis(20));
/// assert_eq!(ticks.load(Ordering::Relaxed), seen);
/// ```
pub struct PeriodicTask {
    interval: Arc<AtomicDuration>,
    worker: Mutex<Option<Worker>>,
}

impl PeriodicTask {
    /// Create a stopped task with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: Arc::new(AtomicDuration::new(interval)),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the loop bound to `callback`. No-op if already running.
    pub fn start<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }

        // Rendezvous channel: a send completes only once the loop takes it.
        let (control, inbox) = channel::bounded(0);
        let interval = Arc::clone(&self.interval);

        let spawned = thread::Builder::new()
            .name("periodic-task".to_string())
            .spawn(move || run(&interval, &inbox, callback));

        match spawned {
            Ok(handle) => {
                tracing::debug!(interval = ?self.interval.get(), "periodic task started");
                *worker = Some(Worker { control, handle });
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn periodic task thread");
            }
        }
    }

    /// Stop the loop. Returns only after the loop has exited, so the callback
    /// never fires after `stop` returns. No-op if not running.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        if let Some(Worker { control, handle }) = worker.take() {
            // Fails only if the loop already died with a panicking callback.
            let _ = control.send(Control::Stop);
            if handle.join().is_err() {
                tracing::warn!("periodic task callback panicked");
            }
            tracing::debug!("periodic task stopped");
        }
    }

    /// Make the loop recompute its deadline from the current interval
    /// without invoking the callback
    pub fn reset(&self) {
        self.signal(Control::Reset);
    }

    /// Invoke the callback now, then restart the wait
    pub fn trigger(&self) {
        self.signal(Control::Trigger);
    }

    /// Current interval
    pub fn interval(&self) -> Duration {
        self.interval.get()
    }

    /// Change the interval; see [`reset`](Self::reset) to apply it at once
    pub fn set_interval(&self, interval: Duration) {
        self.interval.set(interval);
    }

    /// Whether a loop is currently running
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    fn signal(&self, message: Control) {
        let worker = self.worker.lock();
        if let Some(worker) = worker.as_ref() {
            let _ = worker.control.send(message);
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<F: FnMut()>(interval: &AtomicDuration, inbox: &Receiver<Control>, mut callback: F) {
    loop {
        let period = interval.get();
        let deadline = if period.is_zero() {
            never()
        } else {
            after(period)
        };

        let message = select! {
            recv(inbox) -> message => message.unwrap_or(Control::Stop),
            recv(deadline) -> _ => Control::Trigger,
        };

        match message {
            Control::Stop => return,
            Control::Reset => continue,
            Control::Trigger => {}
        }

        callback();
    }
}
