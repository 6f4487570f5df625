//! The reducer: pure state transitions for registry actions.

use crate::{Action, ForceScope};
use loadman_core::{
    ErrorRecord, Instant, LoadError, LoadPhase, LoadSignal, Priority, RegistryState, Unit,
};
use loadman_progress::progress_report;
use tracing::{debug, warn};

/// Apply one action to the state. Returns whether anything changed.
///
/// Latch recomputation is separate (see [`update_latches`]) so it always
/// observes a fully-applied mutation.
pub fn reduce(state: &mut RegistryState, action: Action, now: Instant) -> bool {
    match action {
        Action::Register {
            id,
            priority,
            weight,
            dependencies,
        } => register(state, id, priority, weight, dependencies, now),

        Action::MarkLoaded { id } => match state.units.get_mut(&id) {
            Some(unit) if !unit.loaded => {
                unit.loaded = true;
                unit.loaded_at = Some(now);
                debug!(unit = %id, "unit loaded");
                true
            }
            Some(_) => false,
            None => {
                debug!(unit = %id, "mark_loaded for unknown unit ignored");
                false
            }
        },

        Action::NotifyError { id, error } => match state.units.get_mut(&id) {
            Some(unit) => {
                debug!(unit = %id, error = %error, "unit error recorded");
                unit.error = Some(error.clone());
                state.errors.push(ErrorRecord::new(id, error));
                true
            }
            None => {
                debug!(unit = %id, "error for unknown unit ignored");
                false
            }
        },

        Action::ForceLoaded { scope } => force_loaded(state, scope, now),

        Action::SetThresholds { overrides } => {
            state.thresholds.merge(overrides);
            true
        }

        Action::AnimationComplete => {
            if state.animation_complete {
                false
            } else {
                state.animation_complete = true;
                true
            }
        }

        Action::Reset => {
            // Thresholds are configuration; they survive the epoch change.
            let thresholds = state.thresholds;
            *state = RegistryState::new(now);
            state.thresholds = thresholds;
            debug!(epoch = %state.epoch, "registry reset");
            true
        }
    }
}

fn register(
    state: &mut RegistryState,
    id: String,
    priority: Priority,
    weight: Option<f64>,
    dependencies: Vec<String>,
    now: Instant,
) -> bool {
    let dependencies = Unit::sanitize_dependencies(&id, dependencies);

    if let Some(existing) = state.units.get_mut(&id) {
        if existing.priority == priority && existing.dependencies == dependencies {
            return false;
        }
        // Update in place; loaded state and registration time are preserved.
        existing.priority = priority;
        existing.weight = match weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => priority.default_weight(),
        };
        existing.dependencies = dependencies;
        debug!(unit = %id, %priority, "unit re-registered with changes");
        return true;
    }

    let unit = Unit::new(id, priority, weight, dependencies, now);
    debug!(unit = %unit.id, %priority, weight = unit.weight, "unit registered");
    state.units.insert(unit.id.clone(), unit);
    true
}

fn force_loaded(state: &mut RegistryState, scope: ForceScope, now: Instant) -> bool {
    let mut forced = Vec::new();
    for unit in state.units.values_mut() {
        if unit.loaded {
            continue;
        }
        if scope == ForceScope::Critical && unit.priority != Priority::Critical {
            continue;
        }
        unit.loaded = true;
        unit.loaded_at = Some(now);
        if unit.error.is_none() {
            unit.error = Some(LoadError::ForcedTimeoutCompletion);
        }
        forced.push(unit.id.clone());
    }

    if forced.is_empty() {
        return false;
    }
    warn!(count = forced.len(), ?scope, "safety timeout forced units loaded");
    for id in forced {
        state.errors.push(ErrorRecord::new(id, LoadError::ForcedTimeoutCompletion));
    }
    true
}

/// Advance the page-level phase latch after a fully-applied mutation.
///
/// Returns the signals that newly fired, in order. Each latch fires at most
/// once per epoch; both completion conditions (100% weighted progress,
/// every unit loaded) feed the single page-loaded latch.
pub fn update_latches(state: &mut RegistryState) -> Vec<LoadSignal> {
    let report = progress_report(state);
    let mut signals = Vec::new();

    if state.phase == LoadPhase::Loading
        && report.total_units > 0
        && report.critical_progress >= state.thresholds.critical_threshold
    {
        state.phase = LoadPhase::InitialLoadComplete;
        debug!(critical_progress = report.critical_progress, "initial load complete");
        signals.push(LoadSignal::InitialLoadComplete);
    }

    if state.phase == LoadPhase::InitialLoadComplete && report.is_complete() {
        state.phase = LoadPhase::PageLoaded;
        debug!(progress = report.progress, "page loaded");
        signals.push(LoadSignal::PageLoaded);
    }

    signals
}
