//! Dispatch outcome types.

use serde::Serialize;

use crate::task::TaskKey;

/// What to do when a task's run operation fails outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Propagate the first failure; later candidates in the same call
    /// stay un-dispatched. One-shot removals already earned are still
    /// applied before the error surfaces.
    #[default]
    FailFast,
    /// Record each failure in the report and keep dispatching.
    Isolate,
}

/// Outcome of one dispatch call for one board.
#[derive(Debug, Default, Serialize)]
pub struct DispatchReport {
    /// Tasks whose run operation was invoked.
    pub ran: Vec<TaskKey>,
    /// One-shot tasks removed from the event after running.
    pub removed: Vec<TaskKey>,
    /// Tasks skipped because their required hosts were unavailable.
    pub skipped_no_hosts: Vec<TaskKey>,
    /// Tasks skipped that declare host availability irrelevant.
    pub skipped_hostless: Vec<TaskKey>,
    /// Per-task failures recorded under [`FailurePolicy::Isolate`].
    pub failed: Vec<(TaskKey, String)>,
}

impl DispatchReport {
    /// Number of candidates this call acted on.
    pub fn candidates(&self) -> usize {
        self.ran.len() + self.skipped_no_hosts.len() + self.skipped_hostless.len() + self.failed.len()
    }
}
