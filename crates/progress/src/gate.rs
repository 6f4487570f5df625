//! Dependency and priority visibility gating.

use crate::{progress_report, ProgressReport};
use loadman_core::{Priority, RegistryState};

/// Whether every dependency of a unit is registered and loaded.
///
/// A dependency id that was never registered counts as unmet: the unit stays
/// gated until the dependency shows up and loads. Unknown unit ids are never
/// ready.
pub fn dependencies_met(state: &RegistryState, id: &str) -> bool {
    match state.unit(id) {
        Some(unit) => unit.dependencies.iter().all(|dep| state.is_loaded(dep)),
        None => false,
    }
}

/// Whether a unit may become visible.
///
/// Ready means dependencies are met and, when `wait_for_critical_path` is
/// set, the unit is itself critical or the critical path has fully loaded.
/// Monotonic within an epoch: dependencies only complete, never un-complete.
pub fn is_unit_ready(state: &RegistryState, id: &str, wait_for_critical_path: bool) -> bool {
    let Some(unit) = state.unit(id) else {
        return false;
    };
    if !dependencies_met(state, id) {
        return false;
    }
    if !wait_for_critical_path || unit.priority == Priority::Critical {
        return true;
    }
    progress_report(state).critical_progress == 100
}

/// Whether every unit in a tier has loaded; vacuously true for an empty tier.
pub fn all_with_priority_loaded(state: &RegistryState, priority: Priority) -> bool {
    state.units_with_priority(priority).all(|u| u.loaded)
}

/// Loader visibility policy.
///
/// Hidden once the page is loaded or the exit animation already ran; shown
/// while critical units are outstanding; shown while important units are
/// outstanding and progress sits below the hide threshold; hidden otherwise.
pub fn should_show_loader(state: &RegistryState, report: &ProgressReport) -> bool {
    if state.is_page_loaded() || state.animation_complete {
        return false;
    }
    if !all_with_priority_loaded(state, Priority::Critical) {
        return true;
    }
    if !all_with_priority_loaded(state, Priority::Important)
        && report.progress < state.thresholds.hide_loader_progress
    {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadman_core::{Instant, LoadPhase, Unit};

    fn insert(state: &mut RegistryState, id: &str, priority: Priority, deps: &[&str], loaded: bool) {
        let now = state.epoch_started_at;
        let mut unit = Unit::new(
            id,
            priority,
            None,
            deps.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            now,
        );
        unit.loaded = loaded;
        if loaded {
            unit.loaded_at = Some(now);
        }
        state.units.insert(unit.id.clone(), unit);
    }

    #[tokio::test]
    async fn test_unregistered_dependency_blocks_readiness() {
        let mut state = RegistryState::new(Instant::now());
        // C depends on D, which was never registered; C itself is loaded.
        insert(&mut state, "c", Priority::Secondary, &["d"], true);
        assert!(!dependencies_met(&state, "c"));
        assert!(!is_unit_ready(&state, "c", false));
    }

    #[tokio::test]
    async fn test_ready_once_dependency_loads() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "d", Priority::Critical, &[], false);
        insert(&mut state, "c", Priority::Secondary, &["d"], false);
        assert!(!is_unit_ready(&state, "c", false));

        state.units.get_mut("d").unwrap().loaded = true;
        assert!(is_unit_ready(&state, "c", false));
    }

    #[tokio::test]
    async fn test_critical_path_gates_non_critical_units() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "hero", Priority::Critical, &[], false);
        insert(&mut state, "footer", Priority::Deferred, &[], false);

        assert!(!is_unit_ready(&state, "footer", true));
        // Critical units themselves are never gated on the critical path
        assert!(is_unit_ready(&state, "hero", true));

        state.units.get_mut("hero").unwrap().loaded = true;
        assert!(is_unit_ready(&state, "footer", true));
    }

    #[tokio::test]
    async fn test_empty_tier_is_vacuously_loaded() {
        let state = RegistryState::new(Instant::now());
        assert!(all_with_priority_loaded(&state, Priority::Critical));
    }

    #[tokio::test]
    async fn test_loader_shown_while_critical_outstanding() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "hero", Priority::Critical, &[], false);
        let report = progress_report(&state);
        assert!(should_show_loader(&state, &report));
    }

    #[tokio::test]
    async fn test_loader_hidden_past_threshold_without_important_units() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "hero", Priority::Critical, &[], true);
        insert(&mut state, "footer", Priority::Deferred, &[], false);
        let report = progress_report(&state);
        // Critical done, no important tier -> hidden even below 100%
        assert!(!should_show_loader(&state, &report));
    }

    #[tokio::test]
    async fn test_loader_tracks_important_units_until_threshold() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "hero", Priority::Critical, &[], true);
        insert(&mut state, "nav", Priority::Important, &[], false);
        let report = progress_report(&state);
        // progress 66 < hide threshold 85, important outstanding
        assert!(should_show_loader(&state, &report));

        state.thresholds.hide_loader_progress = 50;
        let report = progress_report(&state);
        assert!(!should_show_loader(&state, &report));
    }

    #[tokio::test]
    async fn test_loader_hidden_after_page_loaded_or_animation() {
        let mut state = RegistryState::new(Instant::now());
        insert(&mut state, "hero", Priority::Critical, &[], false);
        state.animation_complete = true;
        let report = progress_report(&state);
        assert!(!should_show_loader(&state, &report));

        state.animation_complete = false;
        state.phase = LoadPhase::PageLoaded;
        let report = progress_report(&state);
        assert!(!should_show_loader(&state, &report));
    }
}
