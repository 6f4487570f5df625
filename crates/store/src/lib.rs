//! Registry state store.
//!
//! All registry mutation flows through [`Store::dispatch`] as discrete
//! actions, applied synchronously and atomically in call order. Derived
//! latches are recomputed only after an action has fully applied, and
//! listeners observe the post-mutation snapshot.

#![warn(missing_docs)]

mod action;
mod reducer;
mod store;

pub use action::{Action, ForceScope};
pub use reducer::{reduce, update_latches};
pub use store::{Listener, Store, SubscriptionId};
