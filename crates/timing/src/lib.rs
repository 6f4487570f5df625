//! Clock abstraction and the safety timeout coordinator.

#![warn(missing_docs)]

mod clock;
mod coordinator;

pub use clock::{Clock, TokioClock};
pub use coordinator::{Checkpoint, SafetyTimeoutCoordinator};
