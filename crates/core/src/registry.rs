//! The registry: authoritative per-epoch state.

use crate::{EpochId, ErrorRecord, Instant, LoadPhase, Priority, Thresholds, Unit};
use std::collections::HashMap;

/// Authoritative map of unit id -> unit, plus per-epoch derived latches.
///
/// Mutation happens only through the store's reducer (`loadman-store`); this
/// type is the data, not the discipline.
#[derive(Debug, Clone)]
pub struct RegistryState {
    /// Current epoch
    pub epoch: EpochId,

    /// When the epoch began
    pub epoch_started_at: Instant,

    /// All registered units, keyed by id
    pub units: HashMap<String, Unit>,

    /// Current visibility thresholds
    pub thresholds: Thresholds,

    /// Page-level phase latch; never moves backward within an epoch
    pub phase: LoadPhase,

    /// External "loader animation finished" latch
    pub animation_complete: bool,

    /// Append-only error log for the epoch
    pub errors: Vec<ErrorRecord>,
}

impl RegistryState {
    /// Fresh state for a new epoch.
    pub fn new(now: Instant) -> Self {
        Self {
            epoch: EpochId::new(),
            epoch_started_at: now,
            units: HashMap::new(),
            thresholds: Thresholds::default(),
            phase: LoadPhase::Loading,
            animation_complete: false,
            errors: Vec::new(),
        }
    }

    /// Look up a unit.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Whether a unit exists and has loaded.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.units.get(id).map(|u| u.loaded).unwrap_or(false)
    }

    /// Number of registered units.
    pub fn total_units(&self) -> usize {
        self.units.len()
    }

    /// Number of loaded units.
    pub fn loaded_units(&self) -> usize {
        self.units.values().filter(|u| u.loaded).count()
    }

    /// True when at least one unit is registered and all of them loaded.
    pub fn all_loaded(&self) -> bool {
        !self.units.is_empty() && self.units.values().all(|u| u.loaded)
    }

    /// Units in a given tier.
    pub fn units_with_priority(&self, priority: Priority) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.priority == priority)
    }

    /// Whether the critical path has met its threshold this epoch.
    pub fn is_initial_load_complete(&self) -> bool {
        self.phase != LoadPhase::Loading
    }

    /// Whether the page fully loaded this epoch.
    pub fn is_page_loaded(&self) -> bool {
        self.phase == LoadPhase::PageLoaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_state() {
        let state = RegistryState::new(Instant::now());
        assert_eq!(state.total_units(), 0);
        assert!(!state.all_loaded());
        assert!(!state.is_loaded("anything"));
        assert_eq!(state.phase, LoadPhase::Loading);
    }

    #[tokio::test]
    async fn test_all_loaded_requires_at_least_one_unit() {
        let now = Instant::now();
        let mut state = RegistryState::new(now);
        assert!(!state.all_loaded());

        let mut unit = Unit::new("hero", Priority::Critical, None, Vec::new(), now);
        unit.loaded = true;
        unit.loaded_at = Some(now);
        state.units.insert(unit.id.clone(), unit);
        assert!(state.all_loaded());
        assert_eq!(state.loaded_units(), 1);
    }
}
