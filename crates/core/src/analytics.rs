//! Derived analytics snapshots.

use crate::{EpochId, ErrorRecord, Priority, Time};
use serde::{Deserialize, Serialize};

/// A unit's load latency, for the slowest-units report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowUnit {
    /// Unit id
    pub id: String,

    /// Priority tier
    pub priority: Priority,

    /// Milliseconds from registration to load completion
    pub load_duration_ms: u64,
}

/// A read-only snapshot of the current epoch, taken on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Epoch the snapshot belongs to
    pub epoch: EpochId,

    /// When the snapshot was taken
    pub timestamp: Time,

    /// Units registered this epoch
    pub total_units: usize,

    /// Units marked loaded
    pub loaded_units: usize,

    /// Weighted overall progress, 0-100
    pub progress: u8,

    /// Weighted critical-path progress, 0-100
    pub critical_progress: u8,

    /// Milliseconds from epoch start until the last critical unit loaded;
    /// None while the critical path is incomplete or absent
    pub critical_path_duration_ms: Option<u64>,

    /// Milliseconds from epoch start until every unit loaded; None while
    /// loading is in flight
    pub total_duration_ms: Option<u64>,

    /// Append-only error log for the epoch
    pub errors: Vec<ErrorRecord>,

    /// Slowest units by registration-to-load latency, descending
    pub slowest_units: Vec<SlowUnit>,
}
