//! Event triggering and dispatch core for the continuous-testing scheduler.
//!
//! This crate provides:
//! - the [`Event`] capability trait and shared [`EventCore`] state
//! - a de-duplicating [`TaskSet`] keyed by structural task identity
//! - discovery-backend and suite-scheduler contracts
//! - a load-balanced build-server pool for latest-build lookups
//!
//! An external driver owns the polling loop: per event per cycle it calls
//! `update_criteria`, checks `should_handle`, resolves builds per board,
//! and hands the result to `handle` for dispatch.

pub mod devserver;
pub mod discovery;
pub mod error;
pub mod event;
pub mod task;

pub use devserver::{BuildServer, HttpBuildServer, ServerPool};
pub use discovery::{BranchBuilds, DiscoveryBackend};
pub use error::{BuildLookupError, ScheduleError, TaskRunError};
pub use event::{DispatchReport, Event, EventCore, FailurePolicy};
pub use task::{Priority, SuiteRequest, SuiteScheduler, Task, TaskKey, TaskRun, TaskSet};
