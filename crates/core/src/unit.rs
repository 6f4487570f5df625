//! Loadable units and their priority tiers.

use crate::{Instant, LoadError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Priority tier of a loadable unit.
///
/// Tiers are ordered: `Critical` gates the initial-load signal, `Deferred`
/// barely moves the progress needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Must load before the page is considered initially usable
    Critical,
    /// Should load before the loader is hidden
    Important,
    /// Regular content
    Secondary,
    /// Below-the-fold or lazy content
    Deferred,
}

impl Priority {
    /// Default progress weight for this tier.
    pub fn default_weight(&self) -> f64 {
        match self {
            Priority::Critical => 4.0,
            Priority::Important => 2.0,
            Priority::Secondary => 1.0,
            Priority::Deferred => 0.5,
        }
    }

    /// All tiers, highest first.
    pub fn all() -> [Priority; 4] {
        [
            Priority::Critical,
            Priority::Important,
            Priority::Secondary,
            Priority::Deferred,
        ]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::Important => write!(f, "important"),
            Priority::Secondary => write!(f, "secondary"),
            Priority::Deferred => write!(f, "deferred"),
        }
    }
}

/// One trackable piece of loading work.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Unique key within the registry
    pub id: String,

    /// Priority tier
    pub priority: Priority,

    /// Relative contribution to overall progress; always positive
    pub weight: f64,

    /// Ids of units that must be loaded before this one is considered ready.
    /// Self-references are filtered at construction and never stored.
    pub dependencies: HashSet<String>,

    /// Whether the unit has finished loading; monotonic false -> true
    pub loaded: bool,

    /// When the unit was registered
    pub registered_at: Instant,

    /// When the unit finished loading (None until loaded)
    pub loaded_at: Option<Instant>,

    /// Last recorded failure; an annotation, never blocks `loaded`
    pub error: Option<LoadError>,
}

impl Unit {
    /// Create a new unregistered-to-registered unit.
    ///
    /// A non-positive or non-finite `weight` falls back to the priority
    /// default, and any self-dependency is dropped.
    pub fn new(
        id: impl Into<String>,
        priority: Priority,
        weight: Option<f64>,
        dependencies: impl IntoIterator<Item = String>,
        now: Instant,
    ) -> Self {
        let id = id.into();
        let weight = match weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => priority.default_weight(),
        };
        let dependencies = Self::sanitize_dependencies(&id, dependencies);

        Self {
            id,
            priority,
            weight,
            dependencies,
            loaded: false,
            registered_at: now,
            loaded_at: None,
            error: None,
        }
    }

    /// Drop self-references from a dependency list.
    pub fn sanitize_dependencies(
        id: &str,
        dependencies: impl IntoIterator<Item = String>,
    ) -> HashSet<String> {
        dependencies.into_iter().filter(|d| d != id).collect()
    }

    /// Time from registration to load completion, if loaded.
    pub fn load_duration(&self) -> Option<std::time::Duration> {
        self.loaded_at.map(|at| at - self.registered_at)
    }

    /// Whether an error has been recorded for this unit.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
