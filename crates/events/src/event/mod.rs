//! Scheduler events: trigger decision, shared state, and the dispatch loop.
//!
//! An event is a named trigger condition (nightly, weekly, new-build)
//! that, when due, dispatches its de-duplicated task set against a board.
//! Concrete variants supply due-ness and build resolution; [`EventCore`]
//! carries the state and behavior every variant shares, including the
//! config-reload [`merge`](EventCore::merge) and the load-balanced
//! latest-build lookup.

mod core;
mod report;
mod traits;


pub use self::core::EventCore;
pub use self::report::{DispatchReport, FailurePolicy};
pub use self::traits::Event;
