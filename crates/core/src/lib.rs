//! LoadMan core data models.
//!
//! This crate defines the fundamental data structures for the
//! priority-weighted loading orchestrator.

#![warn(missing_docs)]

// Core identities
mod id;

// Units and priorities
mod unit;

// Registry state
mod registry;

// Page-level lifecycle
mod phase;

// Errors and analytics
mod analytics;
mod error;

// Configuration
mod config;

// Re-exports
pub use id::EpochId;

pub use unit::{Priority, Unit};

pub use registry::RegistryState;

pub use phase::{LoadPhase, LoadSignal};

pub use error::{ErrorRecord, LoadError};

pub use analytics::{AnalyticsSnapshot, SlowUnit};

pub use config::{
    ErrorCallback, LoadCallback, OrchestratorConfig, ThresholdOverrides, Thresholds,
};

/// Wall-clock timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Monotonic timestamp type; respects tokio's paused time in tests.
pub type Instant = tokio::time::Instant;
