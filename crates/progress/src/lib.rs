//! Weighted-progress math and visibility gating.
//!
//! Everything here is a pure function of a [`RegistryState`] snapshot; the
//! store recomputes these after each applied action, never mid-mutation.
//!
//! [`RegistryState`]: loadman_core::RegistryState

#![warn(missing_docs)]

mod calculator;
mod gate;

pub use calculator::{progress_report, ProgressReport};
pub use gate::{all_with_priority_loaded, dependencies_met, is_unit_ready, should_show_loader};
