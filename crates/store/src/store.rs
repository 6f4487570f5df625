//! The store: single-writer dispatch plus subscriptions.

use crate::{reduce, update_latches, Action};
use loadman_core::{Instant, LoadSignal, RegistryState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A listener invoked with the post-mutation snapshot after each applied
/// action.
pub type Listener = Arc<dyn Fn(&RegistryState) + Send + Sync>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry store with an explicit dispatch/subscribe surface.
///
/// One mutex guards the state, so actions apply atomically in call order;
/// there is no interleaving. Listeners run after the lock is released, on a
/// snapshot, so they may re-enter the store freely.
pub struct Store {
    state: Mutex<RegistryState>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_subscription: AtomicU64,
}

impl Store {
    /// Create a store with a fresh epoch starting at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            state: Mutex::new(RegistryState::new(now)),
            listeners: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Apply an action, recompute latches, notify listeners.
    ///
    /// Returns the latch signals that newly fired, each at most once per
    /// epoch. An action that changes nothing notifies nobody.
    pub fn dispatch(&self, action: Action, now: Instant) -> Vec<LoadSignal> {
        let (signals, snapshot) = {
            let mut state = self.state.lock().expect("registry lock poisoned");
            if !reduce(&mut state, action, now) {
                return Vec::new();
            }
            let signals = update_latches(&mut state);
            (signals, state.clone())
        };

        let listeners: Vec<Listener> = {
            let listeners = self.listeners.lock().expect("listener lock poisoned");
            listeners.values().cloned().collect()
        };
        for listener in listeners {
            listener(&snapshot);
        }

        signals
    }

    /// Read from the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        let state = self.state.lock().expect("registry lock poisoned");
        f(&state)
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> RegistryState {
        self.read(|state| state.clone())
    }

    /// Register a listener; it fires after every applied action.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .insert(id, listener);
        SubscriptionId(id)
    }

    /// Remove a listener.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .remove(&id.0);
    }
}
