//! Page-level loading lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page-level state machine.
///
/// `Loading -> InitialLoadComplete -> PageLoaded`, terminal within an epoch.
/// An epoch with no critical units moves straight from `Loading` to
/// `PageLoaded`. Only `reset_loading()` returns to `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Units are still being registered and loaded
    Loading,
    /// The critical path has met its threshold
    InitialLoadComplete,
    /// Every unit is loaded (or weighted progress reached 100)
    PageLoaded,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::Loading => write!(f, "loading"),
            LoadPhase::InitialLoadComplete => write!(f, "initial_load_complete"),
            LoadPhase::PageLoaded => write!(f, "page_loaded"),
        }
    }
}

/// A latch transition produced by applying an action to the registry.
///
/// Each signal fires at most once per epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSignal {
    /// The critical path reached its configured threshold
    InitialLoadComplete,
    /// Full completion: 100% weighted progress or every unit loaded
    PageLoaded,
}
