//! LoadMan orchestrator: the consumer-facing loading API.
//!
//! Register units with a priority tier and optional dependencies, report
//! completion from wherever it is observed, and read weighted progress,
//! readiness, and analytics back out. A safety timeout net guarantees the
//! page always completes, even when collaborators never report.
//!
//! ```no_run
//! use loadman_orchestrator::{LoadOrchestrator, OrchestratorConfig, Priority};
//!
//! # async fn demo() {
//! let orchestrator = LoadOrchestrator::new(
//!     OrchestratorConfig::new().with_on_complete(|| println!("page loaded")),
//! );
//! orchestrator.register_component("hero", Priority::Critical, None, Vec::new());
//! orchestrator.register_component("nav", Priority::Important, None, Vec::new());
//! orchestrator.mark_component_loaded("hero");
//! assert!(orchestrator.is_initial_load_complete());
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod orchestrator;
mod probe;

pub use cache::SessionCache;
pub use orchestrator::LoadOrchestrator;
pub use probe::{attach_probe, ProbeHandle, ResourceProbe};

// The types a consumer needs alongside the orchestrator.
pub use loadman_core::{
    AnalyticsSnapshot, ErrorRecord, LoadError, LoadPhase, LoadSignal, OrchestratorConfig,
    Priority, RegistryState, SlowUnit, ThresholdOverrides, Thresholds, Unit,
};
pub use loadman_store::{Listener, SubscriptionId};
pub use loadman_timing::{Clock, TokioClock};
