//! Error taxonomy for loading failures.
//!
//! Every variant is recorded, never fatal: a failed unit is still eventually
//! marked loaded so it cannot block the rest of the page.

use crate::Time;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure observed while loading a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    /// A custom readiness check returned false or panicked
    #[error("readiness strategy failed: {reason}")]
    StrategyFailure {
        /// Why the strategy did not pass
        reason: String,
    },

    /// Transport error, timeout, or non-success status on a data fetch
    #[error("fetch failed: {reason}")]
    FetchFailure {
        /// Transport-level description
        reason: String,
    },

    /// Post-processing of fetched data failed
    #[error("transform failed: {reason}")]
    TransformFailure {
        /// What the transform step reported
        reason: String,
    },

    /// The safety coordinator overrode normal completion
    #[error("forced loaded by safety timeout")]
    ForcedTimeoutCompletion,
}

impl LoadError {
    /// Short machine-readable name for analytics grouping.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::StrategyFailure { .. } => "strategy_failure",
            LoadError::FetchFailure { .. } => "fetch_failure",
            LoadError::TransformFailure { .. } => "transform_failure",
            LoadError::ForcedTimeoutCompletion => "forced_timeout_completion",
        }
    }
}

/// One entry in the epoch's append-only error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unit the error was reported against
    pub unit_id: String,

    /// The recorded failure
    pub error: LoadError,

    /// Wall-clock time of the report
    pub at: Time,
}

impl ErrorRecord {
    /// Record an error against a unit at the current wall-clock time.
    pub fn new(unit_id: impl Into<String>, error: LoadError) -> Self {
        Self {
            unit_id: unit_id.into(),
            error,
            at: chrono::Utc::now(),
        }
    }
}
