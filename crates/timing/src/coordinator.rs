//! Safety timeout coordinator.
//!
//! Multiplexes relative-time checkpoints and named one-off timeouts onto a
//! minimal number of underlying timers. Checkpoints share a single rolling
//! timer task regardless of how many are registered, so the page-wide
//! forced-completion guarantee costs O(1) timers no matter the unit count.

use crate::Clock;
use loadman_core::Instant;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

type TimerCallback = Box<dyn FnOnce() + Send>;

/// A one-shot callback scheduled relative to the coordinator's arm time.
pub struct Checkpoint {
    after: Duration,
    callback: Option<TimerCallback>,
}

impl Checkpoint {
    /// Create a checkpoint firing `after` the coordinator is armed.
    pub fn new(after: Duration, callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            after,
            callback: Some(Box::new(callback)),
        }
    }
}

impl std::fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpoint")
            .field("after", &self.after)
            .field("fired", &self.callback.is_none())
            .finish()
    }
}

struct Inner {
    /// Pending checkpoints, sorted by offset; the head owns the live timer
    checkpoints: Vec<Checkpoint>,
    armed_at: Instant,
    scheduler: Option<JoinHandle<()>>,
    named: HashMap<String, JoinHandle<()>>,
    cancelled: bool,
}

/// Named-timer multiplexer over one clock.
///
/// Must be used from within a tokio runtime; timer tasks follow tokio's
/// clock, so paused-time tests advance them deterministically.
pub struct SafetyTimeoutCoordinator {
    inner: Arc<Mutex<Inner>>,
}

impl SafetyTimeoutCoordinator {
    /// Create an idle coordinator. Call [`schedule`](Self::schedule) to arm
    /// checkpoints; named timeouts work immediately.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                checkpoints: Vec::new(),
                armed_at: clock.now(),
                scheduler: None,
                named: HashMap::new(),
                cancelled: false,
            })),
        }
    }

    /// Arm the checkpoint schedule, measured from now.
    ///
    /// Exactly one underlying timer is live at a time: the scheduler sleeps
    /// until the earliest unfired checkpoint, fires it, and re-arms for the
    /// next. Re-scheduling replaces any prior checkpoint set.
    pub fn schedule(&self, clock: &dyn Clock, checkpoints: Vec<Checkpoint>) {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        if inner.cancelled {
            return;
        }
        if let Some(prior) = inner.scheduler.take() {
            prior.abort();
        }
        inner.armed_at = clock.now();
        inner.checkpoints = checkpoints;
        inner.checkpoints.sort_by_key(|c| c.after);
        debug!(count = inner.checkpoints.len(), "checkpoint schedule armed");

        let shared = Arc::clone(&self.inner);
        inner.scheduler = Some(tokio::spawn(Self::run_schedule(shared)));
    }

    async fn run_schedule(inner: Arc<Mutex<Inner>>) {
        loop {
            let deadline = {
                let guard = inner.lock().expect("coordinator lock poisoned");
                if guard.cancelled {
                    return;
                }
                match guard.checkpoints.first() {
                    Some(checkpoint) => guard.armed_at + checkpoint.after,
                    None => return,
                }
            };

            tokio::time::sleep_until(deadline).await;

            let callback = {
                let mut guard = inner.lock().expect("coordinator lock poisoned");
                if guard.cancelled || guard.checkpoints.is_empty() {
                    return;
                }
                let mut checkpoint = guard.checkpoints.remove(0);
                debug!(after = ?checkpoint.after, "checkpoint fired");
                checkpoint.callback.take()
            };
            if let Some(callback) = callback {
                callback();
            }
        }
    }

    /// Arm (or replace) a named one-off timeout.
    ///
    /// Re-setting a name clears its prior timer first, so collaborators can
    /// push their own deadline back as work progresses.
    pub fn set_timeout(
        &self,
        name: &str,
        delay: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        if inner.cancelled {
            return;
        }
        if let Some(prior) = inner.named.remove(name) {
            prior.abort();
        }

        let shared = Arc::clone(&self.inner);
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Only fire if still registered and the epoch is live.
            let live = {
                let mut guard = shared.lock().expect("coordinator lock poisoned");
                !guard.cancelled && guard.named.remove(&task_name).is_some()
            };
            if live {
                callback();
            }
        });
        debug!(name, ?delay, "named timeout armed");
        inner.named.insert(name.to_string(), handle);
    }

    /// Clear a named timeout; unknown names are ignored.
    pub fn clear_timeout(&self, name: &str) {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        if let Some(handle) = inner.named.remove(name) {
            handle.abort();
            debug!(name, "named timeout cleared");
        }
    }

    /// Number of armed named timeouts.
    pub fn named_timeouts(&self) -> usize {
        self.inner.lock().expect("coordinator lock poisoned").named.len()
    }

    /// Number of checkpoints not yet fired.
    pub fn pending_checkpoints(&self) -> usize {
        self.inner
            .lock()
            .expect("coordinator lock poisoned")
            .checkpoints
            .len()
    }

    /// Stop the checkpoint scheduler and clear every named timer.
    ///
    /// Required on reset/unmount so no timer fires into a dead epoch; a
    /// cancelled coordinator stays inert for good.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().expect("coordinator lock poisoned");
        if inner.cancelled {
            return;
        }
        inner.cancelled = true;
        inner.checkpoints.clear();
        if let Some(handle) = inner.scheduler.take() {
            handle.abort();
        }
        for (_, handle) in inner.named.drain() {
            handle.abort();
        }
        debug!("safety timeout coordinator cancelled");
    }
}

impl Drop for SafetyTimeoutCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}
