//! Weighted progress calculation.

use loadman_core::{Priority, RegistryState};
use serde::{Deserialize, Serialize};

/// Derived progress figures for one registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Weighted overall progress, 0-100
    pub progress: u8,

    /// Weighted critical-path progress, 0-100; 100 when no critical units
    /// exist, so an absent critical path never blocks the initial-load signal
    pub critical_progress: u8,

    /// Sum of all unit weights
    pub total_weight: f64,

    /// Sum of loaded unit weights
    pub loaded_weight: f64,

    /// Sum of critical unit weights
    pub critical_total_weight: f64,

    /// Sum of loaded critical unit weights
    pub critical_loaded_weight: f64,

    /// Registered unit count
    pub total_units: usize,

    /// Loaded unit count
    pub loaded_units: usize,
}

impl ProgressReport {
    /// Whether every registered unit has loaded (false for an empty registry).
    pub fn all_loaded(&self) -> bool {
        self.total_units > 0 && self.loaded_units == self.total_units
    }

    /// The page-loaded condition: full weighted progress or every unit
    /// loaded, with at least one unit registered. Both clauses are derived
    /// signals of the same completion event.
    pub fn is_complete(&self) -> bool {
        (self.total_units > 0 && self.progress == 100) || self.all_loaded()
    }
}

/// Compute weighted overall and critical-path progress for a snapshot.
pub fn progress_report(state: &RegistryState) -> ProgressReport {
    let mut total_weight = 0.0;
    let mut loaded_weight = 0.0;
    let mut critical_total_weight = 0.0;
    let mut critical_loaded_weight = 0.0;
    let mut loaded_units = 0;

    for unit in state.units.values() {
        total_weight += unit.weight;
        if unit.loaded {
            loaded_weight += unit.weight;
            loaded_units += 1;
        }
        if unit.priority == Priority::Critical {
            critical_total_weight += unit.weight;
            if unit.loaded {
                critical_loaded_weight += unit.weight;
            }
        }
    }

    ProgressReport {
        progress: percentage(loaded_weight, total_weight, 0),
        critical_progress: percentage(critical_loaded_weight, critical_total_weight, 100),
        total_weight,
        loaded_weight,
        critical_total_weight,
        critical_loaded_weight,
        total_units: state.total_units(),
        loaded_units,
    }
}

/// Integer percentage clamped to 0-100, with an explicit zero-denominator
/// fallback. Truncates rather than rounds so 100 is reported only at exactly
/// full weight.
fn percentage(part: f64, whole: f64, empty_default: u8) -> u8 {
    if whole <= 0.0 {
        return empty_default;
    }
    ((part / whole) * 100.0).floor().clamp(0.0, 100.0) as u8
}
