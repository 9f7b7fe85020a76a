//! The [`Event`] capability trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::discovery::BranchBuilds;
use crate::error::{BuildLookupError, TaskRunError};
use crate::task::{Priority, SuiteScheduler, Task};

use super::core::EventCore;
use super::report::DispatchReport;

/// A named trigger condition that, when due, dispatches its tasks.
///
/// Concrete variants (nightly, weekly, new-build, new-firmware) supply
/// the required operations; the provided methods carry the behavior every
/// event shares. An incomplete variant fails to compile, which is how a
/// missing required operation surfaces.
///
/// Overrides of [`should_handle`](Event::should_handle) must OR their own
/// due-ness check with the base result so the always-handle config
/// override keeps working. [`filter_tasks`](Event::filter_tasks) is a
/// pure filter over the current set; it must never mutate it.
#[async_trait]
pub trait Event: Send + Sync {
    /// Shared event state (keyword, task set, backend handle).
    fn core(&self) -> &EventCore;

    /// One-time setup before the first trigger cycle.
    async fn prepare(&self) -> Result<(), BuildLookupError>;

    /// Refresh the state consulted by [`should_handle`](Event::should_handle).
    ///
    /// Call before relying on a fresh `should_handle` result. Backend
    /// failures propagate; there are no retries at this layer.
    async fn update_criteria(&self) -> Result<(), BuildLookupError>;

    /// Builds per branch for `board` since this event's last check.
    async fn branch_builds_for_board(&self, board: &str)
        -> Result<BranchBuilds, BuildLookupError>;

    /// Launch-control builds for `board` since this event's last check.
    async fn launch_control_builds_for_board(
        &self,
        board: &str,
    ) -> Result<Vec<String>, BuildLookupError>;

    /// The keyword naming this event, e.g. `"nightly"`.
    fn keyword(&self) -> &str {
        self.core().keyword()
    }

    /// Whether the event is due now. Base behavior: the always-handle
    /// config override.
    fn should_handle(&self) -> bool {
        self.core().always_handle()
    }

    /// Tasks eligible to run right now. Base behavior: every task.
    fn filter_tasks(&self) -> Vec<Arc<dyn Task>> {
        self.core().tasks_snapshot()
    }

    /// Priority attached to suites kicked off by this event.
    fn priority(&self) -> Priority {
        Priority::Default
    }

    /// Max lifetime, in hours, of suites kicked off by this event.
    fn timeout_hours(&self) -> u32 {
        24
    }

    /// Dispatch eligible tasks against `board`.
    ///
    /// With `force`, every task in the set is a candidate regardless of
    /// [`filter_tasks`](Event::filter_tasks). See [`EventCore::dispatch`]
    /// for the loop and removal semantics.
    async fn handle(
        &self,
        scheduler: &dyn SuiteScheduler,
        branch_builds: &BranchBuilds,
        board: &str,
        force: bool,
        launch_control_builds: Option<&[String]>,
    ) -> Result<DispatchReport, TaskRunError> {
        let candidates = if force {
            self.core().tasks_snapshot()
        } else {
            self.filter_tasks()
        };
        self.core()
            .dispatch(
                candidates,
                scheduler,
                branch_builds,
                board,
                force,
                launch_control_builds,
            )
            .await
    }
}
