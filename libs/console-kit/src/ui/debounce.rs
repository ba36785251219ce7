//! Request sequencing and debounced scheduling.
//!
//! Every fetch a controller starts gets a [`Ticket`]. Only a result whose
//! ticket is still the latest one issued may be applied, so responses that
//! arrive out of order are dropped instead of overwriting newer state.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket that supersedes every earlier one.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede every outstanding ticket without issuing a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}

/// Runs at most one pending job after a quiet period.
///
/// Scheduling again before the delay expires aborts the previous job, timer
/// and in-flight work alike, and supersedes its ticket.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<AbortHandle>>,
    sequencer: RequestSequencer,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `job` once the delay elapses without another call.
    pub fn schedule<F, Fut>(&self, job: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.start(self.delay, job)
    }

    /// Run `job` immediately, replacing anything pending.
    pub fn fire_now<F, Fut>(&self, job: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.start(Duration::ZERO, job)
    }

    /// Drop the pending job and invalidate its ticket.
    pub fn cancel(&self) {
        if let Some(prev) = self.pending.lock().take() {
            prev.abort();
        }
        self.sequencer.invalidate();
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sequencer.is_current(ticket)
    }

    fn start<F, Fut>(&self, delay: Duration, job: F) -> JoinHandle<()>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some(prev) = pending.take() {
            prev.abort();
        }
        let ticket = self.sequencer.issue();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            job(ticket).await;
        });
        *pending = Some(handle.abort_handle());
        handle
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(prev) = self.pending.get_mut().take() {
            prev.abort();
        }
    }
}
