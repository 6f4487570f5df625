//! Unique identifiers for LoadMan entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a loading epoch.
///
/// A new epoch starts on every `reset_loading()`; all monotonic guarantees
/// (latches, completion callbacks) hold within one epoch only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpochId(Ulid);

impl EpochId {
    /// Generate a new EpochId
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(s.parse()?))
    }
}

impl Default for EpochId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EpochId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EpochId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
