//! Orchestrator configuration.
//!
//! One explicit struct replaces the optional-callback soup found at call
//! sites in typical loader implementations; defaults are documented here.

use crate::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Percentage thresholds that gate loader visibility and the initial-load
/// signal. Runtime-mutable via [`ThresholdOverrides`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Hide the loader once progress passes this percentage, provided no
    /// important units are outstanding
    pub hide_loader_progress: u8,

    /// Critical-path percentage required for initial-load-complete
    pub critical_threshold: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hide_loader_progress: 85,
            critical_threshold: 100,
        }
    }
}

impl Thresholds {
    /// Apply a partial override, clamping values to 0-100.
    pub fn merge(&mut self, overrides: ThresholdOverrides) {
        if let Some(v) = overrides.hide_loader_progress {
            self.hide_loader_progress = v.min(100);
        }
        if let Some(v) = overrides.critical_threshold {
            self.critical_threshold = v.min(100);
        }
    }
}

/// Partial threshold update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    /// New hide-loader percentage
    pub hide_loader_progress: Option<u8>,

    /// New critical-path percentage
    pub critical_threshold: Option<u8>,
}

/// Callback invoked on a latch transition (no arguments, at most once per epoch).
pub type LoadCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked when an error is recorded against a unit.
pub type ErrorCallback = Arc<dyn Fn(&str, &LoadError) + Send + Sync>;

/// Configuration for the load orchestrator.
///
/// Defaults:
///
/// | field | default |
/// |---|---|
/// | `max_wait_time` | 10 s |
/// | `thresholds.hide_loader_progress` | 85 |
/// | `thresholds.critical_threshold` | 100 |
/// | `wait_for_critical_path` | true |
/// | `slowest_units_reported` | 5 |
/// | `cache_ttl` | 60 s |
/// | callbacks | none |
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on time-to-completion: at half this the coordinator forces
    /// critical units loaded, at the full value it forces everything
    pub max_wait_time: Duration,

    /// Visibility and initial-load thresholds
    pub thresholds: Thresholds,

    /// Whether non-critical units stay gated until the critical path is done
    pub wait_for_critical_path: bool,

    /// How many slowest units an analytics snapshot reports
    pub slowest_units_reported: usize,

    /// Time-to-live for entries in the session fetch cache
    pub cache_ttl: Duration,

    /// Invoked once per epoch when the critical path meets its threshold
    pub on_initial_load_complete: Option<LoadCallback>,

    /// Invoked once per epoch on full completion
    pub on_complete: Option<LoadCallback>,

    /// Invoked for every recorded unit error
    pub on_error: Option<ErrorCallback>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_wait_time: Duration::from_secs(10),
            thresholds: Thresholds::default(),
            wait_for_critical_path: true,
            slowest_units_reported: 5,
            cache_ttl: Duration::from_secs(60),
            on_initial_load_complete: None,
            on_complete: None,
            on_error: None,
        }
    }
}

impl OrchestratorConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the safety-timeout ceiling.
    pub fn with_max_wait_time(mut self, max_wait_time: Duration) -> Self {
        self.max_wait_time = max_wait_time;
        self
    }

    /// Set the visibility thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set whether non-critical units wait on the critical path.
    pub fn with_wait_for_critical_path(mut self, wait: bool) -> Self {
        self.wait_for_critical_path = wait;
        self
    }

    /// Set the completion callback.
    pub fn with_on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Set the initial-load callback.
    pub fn with_on_initial_load_complete(
        mut self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_initial_load_complete = Some(Arc::new(callback));
        self
    }

    /// Set the error callback.
    pub fn with_on_error(
        mut self,
        callback: impl Fn(&str, &LoadError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("max_wait_time", &self.max_wait_time)
            .field("thresholds", &self.thresholds)
            .field("wait_for_critical_path", &self.wait_for_critical_path)
            .field("slowest_units_reported", &self.slowest_units_reported)
            .field("cache_ttl", &self.cache_ttl)
            .field("on_initial_load_complete", &self.on_initial_load_complete.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
