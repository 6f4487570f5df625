//! Registry actions.

use loadman_core::{LoadError, Priority, ThresholdOverrides};

/// Which units a forced-completion action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceScope {
    /// Only critical-priority units
    Critical,
    /// Every registered unit
    All,
}

/// An atomic registry mutation.
///
/// Actions on unknown unit ids are silently ignored; the registry is
/// defensive against late or duplicate callbacks from collaborators whose
/// lifecycle it does not control.
#[derive(Debug, Clone)]
pub enum Action {
    /// Register a unit, or update its priority/dependencies if they changed.
    /// Idempotent when nothing changed; never resets `loaded`.
    Register {
        /// Unit id
        id: String,
        /// Priority tier
        priority: Priority,
        /// Explicit weight; `None` (or a non-positive value) uses the tier default
        weight: Option<f64>,
        /// Dependency ids; self-references are dropped before storage
        dependencies: Vec<String>,
    },

    /// Mark a unit loaded. Idempotent; `loaded_at` is set by the first call only.
    MarkLoaded {
        /// Unit id
        id: String,
    },

    /// Record an error against a unit without affecting `loaded`.
    NotifyError {
        /// Unit id
        id: String,
        /// The failure to record
        error: LoadError,
    },

    /// Safety-coordinator override: force outstanding units to loaded.
    ForceLoaded {
        /// Which tiers to force
        scope: ForceScope,
    },

    /// Merge partial threshold overrides.
    SetThresholds {
        /// The overrides to apply
        overrides: ThresholdOverrides,
    },

    /// Set the external "loader exit animation finished" latch.
    AnimationComplete,

    /// Clear everything and begin a new epoch.
    Reset,
}
