//! The load orchestrator: consumer-facing façade.

use crate::SessionCache;
use loadman_core::{
    AnalyticsSnapshot, Instant, LoadError, LoadPhase, LoadSignal, OrchestratorConfig, Priority,
    SlowUnit, ThresholdOverrides,
};
use loadman_progress::{self as progress, progress_report};
use loadman_store::{Action, ForceScope, Listener, Store, SubscriptionId};
use loadman_timing::{Checkpoint, Clock, SafetyTimeoutCoordinator, TokioClock};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Priority-weighted loading orchestrator.
///
/// Composes the registry store, progress calculator, dependency/priority
/// gate, and safety timeout coordinator behind one API. All methods are
/// callable from any thread; mutations apply atomically in call order and
/// never fail on bad caller input.
///
/// Construct inside a tokio runtime: the safety net arms immediately, and
/// once `max_wait_time` elapses every outstanding unit is force-loaded so a
/// stalled collaborator can never wedge the page.
pub struct LoadOrchestrator {
    config: OrchestratorConfig,
    clock: Arc<dyn Clock>,
    store: Arc<Store>,
    coordinator: Mutex<Arc<SafetyTimeoutCoordinator>>,
    cache: SessionCache,
}

impl LoadOrchestrator {
    /// Create an orchestrator with the default tokio-backed clock.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    /// Create an orchestrator with an injected clock.
    pub fn with_clock(config: OrchestratorConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(Store::new(clock.now()));
        let cache = SessionCache::new(config.cache_ttl, Arc::clone(&clock));
        let orchestrator = Self {
            config,
            clock: Arc::clone(&clock),
            store,
            coordinator: Mutex::new(Arc::new(SafetyTimeoutCoordinator::new(clock))),
            cache,
        };
        orchestrator.arm_safety_net();
        orchestrator
    }

    /// Arm the epoch's safety net: at half of `max_wait_time` the critical
    /// path is forced loaded, at the full value everything is.
    fn arm_safety_net(&self) {
        let coordinator = self.current_coordinator();
        let halfway = self.config.max_wait_time / 2;

        let force_critical = self.force_action(ForceScope::Critical);
        let force_all = self.force_action(ForceScope::All);
        coordinator.schedule(
            self.clock.as_ref(),
            vec![
                Checkpoint::new(halfway, force_critical),
                Checkpoint::new(self.config.max_wait_time, force_all),
            ],
        );
    }

    fn force_action(&self, scope: ForceScope) -> impl FnOnce() + Send + 'static {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let config = self.config.clone();
        move || {
            Self::apply(&store, clock.as_ref(), &config, Action::ForceLoaded { scope });
        }
    }

    /// Dispatch an action and run latch callbacks for whatever newly fired.
    fn apply(store: &Store, clock: &dyn Clock, config: &OrchestratorConfig, action: Action) {
        for signal in store.dispatch(action, clock.now()) {
            match signal {
                LoadSignal::InitialLoadComplete => {
                    info!("initial load complete");
                    if let Some(callback) = &config.on_initial_load_complete {
                        callback();
                    }
                }
                LoadSignal::PageLoaded => {
                    info!("page loaded");
                    if let Some(callback) = &config.on_complete {
                        callback();
                    }
                }
            }
        }
    }

    fn dispatch(&self, action: Action) {
        Self::apply(&self.store, self.clock.as_ref(), &self.config, action);
    }

    fn current_coordinator(&self) -> Arc<SafetyTimeoutCoordinator> {
        Arc::clone(&self.coordinator.lock().expect("coordinator lock poisoned"))
    }

    // ------------------------------------------------------------------
    // Registration and completion reporting
    // ------------------------------------------------------------------

    /// Register a loadable unit. Idempotent when priority and dependencies
    /// are unchanged; a changed registration never resets `loaded`.
    pub fn register_component(
        &self,
        id: impl Into<String>,
        priority: Priority,
        weight: Option<f64>,
        dependencies: Vec<String>,
    ) {
        self.dispatch(Action::Register {
            id: id.into(),
            priority,
            weight,
            dependencies,
        });
    }

    /// Report a unit as loaded. Idempotent; unknown ids are ignored.
    pub fn mark_component_loaded(&self, id: &str) {
        self.dispatch(Action::MarkLoaded { id: id.to_string() });
    }

    /// Record an error against a unit. The unit can (and eventually will)
    /// still be marked loaded; unknown ids are ignored.
    pub fn notify_error(&self, id: &str, error: LoadError) {
        let known = self.store.read(|state| state.units.contains_key(id));
        if !known {
            return;
        }
        self.dispatch(Action::NotifyError {
            id: id.to_string(),
            error: error.clone(),
        });
        if let Some(callback) = &self.config.on_error {
            callback(id, &error);
        }
    }

    /// Signal that the loader's exit animation finished, releasing the
    /// loader-visibility latch.
    pub fn notify_animation_complete(&self) {
        self.dispatch(Action::AnimationComplete);
    }

    /// Merge partial threshold overrides at runtime.
    pub fn set_loader_thresholds(&self, overrides: ThresholdOverrides) {
        self.dispatch(Action::SetThresholds { overrides });
    }

    /// Clear all units, errors, and latches; cancel the epoch's timers; and
    /// re-arm the safety net for a fresh epoch.
    pub fn reset_loading(&self) {
        {
            let mut coordinator = self.coordinator.lock().expect("coordinator lock poisoned");
            coordinator.cancel();
            *coordinator = Arc::new(SafetyTimeoutCoordinator::new(Arc::clone(&self.clock)));
        }
        self.dispatch(Action::Reset);
        self.cache.clear();
        self.arm_safety_net();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether a unit exists and has loaded.
    pub fn is_component_loaded(&self, id: &str) -> bool {
        self.store.read(|state| state.is_loaded(id))
    }

    /// Whether a unit's dependencies are met and its priority gate is open.
    pub fn is_component_ready(&self, id: &str) -> bool {
        let wait = self.config.wait_for_critical_path;
        self.store.read(|state| progress::is_unit_ready(state, id, wait))
    }

    /// Whether every unit in a tier has loaded (vacuously true for an empty
    /// tier).
    pub fn are_all_components_with_priority_loaded(&self, priority: Priority) -> bool {
        self.store
            .read(|state| progress::all_with_priority_loaded(state, priority))
    }

    /// Loader visibility policy, evaluated on demand.
    pub fn should_show_loader(&self) -> bool {
        self.store.read(|state| {
            let report = progress_report(state);
            progress::should_show_loader(state, &report)
        })
    }

    /// Default weight for a priority tier.
    pub fn get_priority_weight(&self, priority: Priority) -> f64 {
        priority.default_weight()
    }

    /// Weighted overall progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.store.read(|state| progress_report(state).progress)
    }

    /// Weighted critical-path progress, 0-100.
    pub fn critical_progress(&self) -> u8 {
        self.store.read(|state| progress_report(state).critical_progress)
    }

    /// Whether the critical path met its threshold this epoch.
    pub fn is_initial_load_complete(&self) -> bool {
        self.store.read(|state| state.is_initial_load_complete())
    }

    /// Whether the page fully loaded this epoch.
    pub fn is_page_loaded(&self) -> bool {
        self.store.read(|state| state.is_page_loaded())
    }

    /// Current page-level phase.
    pub fn load_phase(&self) -> LoadPhase {
        self.store.read(|state| state.phase)
    }

    /// Take a read-only analytics snapshot of the current epoch.
    pub fn get_analytics(&self) -> AnalyticsSnapshot {
        let state = self.store.snapshot();
        let report = progress_report(&state);
        let started = state.epoch_started_at;

        let critical_path_duration_ms = latest_loaded_at(
            state
                .units
                .values()
                .filter(|u| u.priority == Priority::Critical),
        )
        .map(|at| duration_ms(started, at));

        let total_duration_ms = if state.all_loaded() {
            latest_loaded_at(state.units.values()).map(|at| duration_ms(started, at))
        } else {
            None
        };

        let mut slowest_units: Vec<SlowUnit> = state
            .units
            .values()
            .filter_map(|unit| {
                unit.load_duration().map(|d| SlowUnit {
                    id: unit.id.clone(),
                    priority: unit.priority,
                    load_duration_ms: d.as_millis() as u64,
                })
            })
            .collect();
        slowest_units.sort_by(|a, b| b.load_duration_ms.cmp(&a.load_duration_ms));
        slowest_units.truncate(self.config.slowest_units_reported);

        AnalyticsSnapshot {
            epoch: state.epoch,
            timestamp: chrono::Utc::now(),
            total_units: report.total_units,
            loaded_units: report.loaded_units,
            progress: report.progress,
            critical_progress: report.critical_progress,
            critical_path_duration_ms,
            total_duration_ms,
            errors: state.errors,
            slowest_units,
        }
    }

    // ------------------------------------------------------------------
    // Collaborator facilities
    // ------------------------------------------------------------------

    /// Subscribe to post-mutation registry snapshots.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.store.unsubscribe(id)
    }

    /// Arm (or replace) a named one-off timeout on the epoch's coordinator.
    /// Collaborators use this to self-bound their worst-case latency.
    pub fn set_timeout(&self, name: &str, delay: Duration, callback: impl FnOnce() + Send + 'static) {
        self.current_coordinator().set_timeout(name, delay, callback);
    }

    /// Clear a named timeout.
    pub fn clear_timeout(&self, name: &str) {
        self.current_coordinator().clear_timeout(name);
    }

    /// The session-scoped fetched-data cache.
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }
}

impl Drop for LoadOrchestrator {
    fn drop(&mut self) {
        // Stop timers so nothing fires into a dropped epoch.
        self.current_coordinator().cancel();
    }
}

fn latest_loaded_at<'a>(units: impl Iterator<Item = &'a loadman_core::Unit>) -> Option<Instant> {
    let mut latest = None;
    let mut any_pending = false;
    for unit in units {
        match unit.loaded_at {
            Some(at) => latest = Some(latest.map_or(at, |l: Instant| l.max(at))),
            None => any_pending = true,
        }
    }
    if any_pending {
        None
    } else {
        latest
    }
}

fn duration_ms(from: Instant, to: Instant) -> u64 {
    to.saturating_duration_since(from).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_config(
        max_wait: Duration,
    ) -> (OrchestratorConfig, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let initial = Arc::new(AtomicUsize::new(0));
        let complete = Arc::new(AtomicUsize::new(0));
        let initial_clone = Arc::clone(&initial);
        let complete_clone = Arc::clone(&complete);
        let config = OrchestratorConfig::new()
            .with_max_wait_time(max_wait)
            .with_on_initial_load_complete(move || {
                initial_clone.fetch_add(1, Ordering::SeqCst);
            })
            .with_on_complete(move || {
                complete_clone.fetch_add(1, Ordering::SeqCst);
            });
        (config, initial, complete)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_unit_load_scenario() {
        let (config, initial, complete) = counting_config(Duration::from_secs(60));
        let orchestrator = LoadOrchestrator::new(config);

        orchestrator.register_component("a", Priority::Critical, Some(4.0), Vec::new());
        orchestrator.register_component("b", Priority::Important, Some(2.0), Vec::new());
        assert_eq!(orchestrator.progress(), 0);
        assert!(orchestrator.should_show_loader());

        orchestrator.mark_component_loaded("a");
        assert_eq!(orchestrator.progress(), 66);
        assert_eq!(orchestrator.critical_progress(), 100);
        assert!(orchestrator.is_initial_load_complete());
        assert_eq!(initial.load(Ordering::SeqCst), 1);
        assert!(!orchestrator.is_page_loaded());

        orchestrator.mark_component_loaded("b");
        assert_eq!(orchestrator.progress(), 100);
        assert!(orchestrator.is_page_loaded());
        assert_eq!(complete.load(Ordering::SeqCst), 1);
        assert!(!orchestrator.should_show_loader());

        // Late duplicate callbacks change nothing.
        orchestrator.mark_component_loaded("a");
        orchestrator.mark_component_loaded("b");
        assert_eq!(initial.load(Ordering::SeqCst), 1);
        assert_eq!(complete.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_safety_net_forces_completion() {
        let (config, _initial, complete) = counting_config(Duration::from_secs(10));
        let orchestrator = LoadOrchestrator::new(config);

        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        orchestrator.register_component("footer", Priority::Deferred, None, Vec::new());

        // Halfway checkpoint forces only the critical path.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(orchestrator.is_component_loaded("hero"));
        assert!(!orchestrator.is_component_loaded("footer"));
        assert!(orchestrator.is_initial_load_complete());

        // Final checkpoint forces everything, completion fires exactly once.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(orchestrator.is_component_loaded("footer"));
        assert!(orchestrator.is_page_loaded());
        assert_eq!(complete.load(Ordering::SeqCst), 1);

        let analytics = orchestrator.get_analytics();
        assert!(analytics
            .errors
            .iter()
            .any(|e| e.error == LoadError::ForcedTimeoutCompletion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_stale_safety_net() {
        let (config, _initial, _complete) = counting_config(Duration::from_secs(10));
        let orchestrator = LoadOrchestrator::new(config);
        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());

        tokio::time::sleep(Duration::from_secs(3)).await;
        orchestrator.reset_loading();
        orchestrator.register_component("hero2", Priority::Critical, None, Vec::new());

        // The old halfway checkpoint (t=5) must not fire into the new epoch.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!orchestrator.is_component_loaded("hero2"));

        // The re-armed net still bounds the new epoch (t=3+5=8).
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(orchestrator.is_component_loaded("hero2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_analytics_and_relatches() {
        let (config, initial, complete) = counting_config(Duration::from_secs(60));
        let orchestrator = LoadOrchestrator::new(config);

        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        orchestrator.notify_error(
            "hero",
            LoadError::FetchFailure { reason: "503".to_string() },
        );
        orchestrator.mark_component_loaded("hero");
        assert_eq!(complete.load(Ordering::SeqCst), 1);
        let first_epoch = orchestrator.get_analytics().epoch;

        orchestrator.reset_loading();
        let analytics = orchestrator.get_analytics();
        assert_ne!(analytics.epoch, first_epoch);
        assert_eq!(analytics.total_units, 0);
        assert!(analytics.errors.is_empty());
        assert_eq!(orchestrator.load_phase(), LoadPhase::Loading);

        // Latches re-arm with the new epoch.
        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        orchestrator.mark_component_loaded("hero");
        assert_eq!(initial.load(Ordering::SeqCst), 2);
        assert_eq!(complete.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_callback_and_unknown_ids() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&errors);
        let config = OrchestratorConfig::new().with_on_error(move |id, error| {
            seen.lock().unwrap().push((id.to_string(), error.kind()));
        });
        let orchestrator = LoadOrchestrator::new(config);

        orchestrator.register_component("data", Priority::Important, None, Vec::new());
        orchestrator.notify_error(
            "data",
            LoadError::TransformFailure { reason: "bad shape".to_string() },
        );
        // Unknown id: defensively ignored, no callback.
        orchestrator.notify_error("ghost", LoadError::ForcedTimeoutCompletion);

        assert_eq!(
            *errors.lock().unwrap(),
            vec![("data".to_string(), "transform_failure")]
        );
        assert!(!orchestrator.is_component_loaded("data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dependency_gating_through_api() {
        let orchestrator = LoadOrchestrator::new(OrchestratorConfig::default());
        orchestrator.register_component(
            "c",
            Priority::Secondary,
            None,
            vec!["d".to_string()],
        );
        orchestrator.mark_component_loaded("c");

        // D was never registered, so C stays gated despite being loaded.
        assert!(orchestrator.is_component_loaded("c"));
        assert!(!orchestrator.is_component_ready("c"));

        orchestrator.register_component("d", Priority::Critical, None, Vec::new());
        orchestrator.mark_component_loaded("d");
        assert!(orchestrator.is_component_ready("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_thresholds_and_loader_policy() {
        let orchestrator = LoadOrchestrator::new(OrchestratorConfig::default());
        orchestrator.register_component("hero", Priority::Critical, Some(4.0), Vec::new());
        orchestrator.register_component("nav", Priority::Important, Some(2.0), Vec::new());
        orchestrator.mark_component_loaded("hero");

        // 66 < 85: loader stays up while important units are outstanding.
        assert!(orchestrator.should_show_loader());
        orchestrator.set_loader_thresholds(ThresholdOverrides {
            hide_loader_progress: Some(50),
            critical_threshold: None,
        });
        assert!(!orchestrator.should_show_loader());
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_latch_hides_loader() {
        let orchestrator = LoadOrchestrator::new(OrchestratorConfig::default());
        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        assert!(orchestrator.should_show_loader());
        orchestrator.notify_animation_complete();
        assert!(!orchestrator.should_show_loader());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analytics_durations_and_slowest_units() {
        let orchestrator = LoadOrchestrator::new(
            OrchestratorConfig::new().with_max_wait_time(Duration::from_secs(600)),
        );
        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        orchestrator.register_component("nav", Priority::Important, None, Vec::new());

        tokio::time::advance(Duration::from_millis(100)).await;
        orchestrator.mark_component_loaded("hero");
        tokio::time::advance(Duration::from_millis(200)).await;
        orchestrator.mark_component_loaded("nav");

        let analytics = orchestrator.get_analytics();
        assert_eq!(analytics.total_units, 2);
        assert_eq!(analytics.loaded_units, 2);
        assert_eq!(analytics.critical_path_duration_ms, Some(100));
        assert_eq!(analytics.total_duration_ms, Some(300));
        assert_eq!(analytics.slowest_units.len(), 2);
        // Descending by latency: nav took 300ms, hero 100ms.
        assert_eq!(analytics.slowest_units[0].id, "nav");
        assert_eq!(analytics.slowest_units[0].load_duration_ms, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_named_timeout_backstops_a_resource_class() {
        let orchestrator = Arc::new(LoadOrchestrator::new(
            OrchestratorConfig::new().with_max_wait_time(Duration::from_secs(600)),
        ));
        orchestrator.register_component("fonts", Priority::Important, None, Vec::new());

        let backstop = Arc::clone(&orchestrator);
        orchestrator.set_timeout("fonts", Duration::from_secs(3), move || {
            backstop.mark_component_loaded("fonts");
        });

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(orchestrator.is_component_loaded("fonts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_observe_updates() {
        let orchestrator = LoadOrchestrator::new(OrchestratorConfig::default());
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let id = orchestrator.subscribe(Arc::new(move |_: &loadman_core::RegistryState| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
        orchestrator.mark_component_loaded("hero");
        assert_eq!(notified.load(Ordering::SeqCst), 2);

        orchestrator.unsubscribe(id);
        orchestrator.register_component("nav", Priority::Important, None, Vec::new());
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }
}
