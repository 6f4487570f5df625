//! Collaborator contract for resource probes.
//!
//! A probe owns the detection of one resource class (images, fonts, a data
//! fetch) outside the core. It registers sub-units, eventually reports each
//! one loaded or failed, and should use the named-timeout facility to bound
//! its own worst-case latency. Probe failures are recorded, never fatal.

use crate::LoadOrchestrator;
use async_trait::async_trait;
use loadman_core::{LoadError, Priority};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// An external readiness detector for one parent unit.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// Id of the parent unit this probe reports for.
    fn id(&self) -> &str;

    /// Priority of the parent unit.
    fn priority(&self) -> Priority {
        Priority::Secondary
    }

    /// Dependencies of the parent unit.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Watch the resource until it is loaded, reporting through `handle`.
    ///
    /// Returning `Err` records the failure and marks the parent loaded
    /// anyway, so a broken probe cannot block the page.
    async fn watch(&self, handle: ProbeHandle) -> Result<(), LoadError>;
}

/// Capability handle given to a probe: report completion, record errors,
/// register sub-units, and self-bound with named timeouts.
#[derive(Clone)]
pub struct ProbeHandle {
    orchestrator: Arc<LoadOrchestrator>,
    unit_id: String,
}

impl ProbeHandle {
    /// Id of the parent unit.
    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Register a sub-unit under the parent id (stored as `parent:suffix`).
    pub fn register_subunit(&self, suffix: &str, priority: Priority, weight: Option<f64>) {
        self.orchestrator.register_component(
            self.subunit_id(suffix),
            priority,
            weight,
            vec![self.unit_id.clone()],
        );
    }

    /// Mark the parent unit loaded.
    pub fn mark_loaded(&self) {
        self.orchestrator.mark_component_loaded(&self.unit_id);
    }

    /// Mark a sub-unit loaded.
    pub fn mark_subunit_loaded(&self, suffix: &str) {
        self.orchestrator
            .mark_component_loaded(&self.subunit_id(suffix));
    }

    /// Record an error against the parent unit.
    pub fn notify_error(&self, error: LoadError) {
        self.orchestrator.notify_error(&self.unit_id, error);
    }

    /// Arm a named timeout scoped to this probe (`parent:name`).
    pub fn set_timeout(&self, name: &str, delay: Duration, callback: impl FnOnce() + Send + 'static) {
        self.orchestrator
            .set_timeout(&self.scoped_timer(name), delay, callback);
    }

    /// Clear a probe-scoped named timeout.
    pub fn clear_timeout(&self, name: &str) {
        self.orchestrator.clear_timeout(&self.scoped_timer(name));
    }

    fn subunit_id(&self, suffix: &str) -> String {
        format!("{}:{}", self.unit_id, suffix)
    }

    fn scoped_timer(&self, name: &str) -> String {
        format!("{}:{}", self.unit_id, name)
    }
}

/// Register a probe's parent unit and spawn its watch future.
///
/// The returned handle is for observation; the probe's outcome is already
/// bounded by the safety net, so callers rarely need to join it.
pub fn attach_probe(
    orchestrator: &Arc<LoadOrchestrator>,
    probe: Arc<dyn ResourceProbe>,
) -> JoinHandle<()> {
    orchestrator.register_component(
        probe.id(),
        probe.priority(),
        None,
        probe.dependencies(),
    );
    let handle = ProbeHandle {
        orchestrator: Arc::clone(orchestrator),
        unit_id: probe.id().to_string(),
    };

    tokio::spawn(async move {
        if let Err(error) = probe.watch(handle.clone()).await {
            debug!(unit = handle.unit_id(), %error, "probe failed; unit completes anyway");
            handle.notify_error(error);
            handle.mark_loaded();
        }
    })
}
