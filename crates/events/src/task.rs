//! Task contract and the de-duplicating task set.
//!
//! A task is one test-suite-on-one-build dispatch rule, implemented
//! outside this crate. The triggering core relies only on the contract
//! here: structural identity for de-duplication, launch-control
//! branch/target declarations, host-availability checks, and the run
//! operation whose boolean return decides whether the task survives the
//! firing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::discovery::{BranchBuilds, DiscoveryBackend};
use crate::error::{ScheduleError, TaskRunError};

// ── Suite priority ──────────────────────────────────────────────────

/// Priority attached to suites kicked off by an event.
///
/// Ordered least to most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
    Weekly,
    Daily,
    PostBuild,
    #[default]
    Default,
}

// ── External scheduler contract ─────────────────────────────────────

/// One suite run for the external scheduler to kick off.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteRequest {
    pub suite: String,
    pub board: String,
    pub build: String,
    /// Host pool label, when the suite is pinned to one.
    pub pool: Option<String>,
    pub priority: Priority,
    pub timeout_hours: u32,
    /// Bypass the scheduler's duplicate-run suppression.
    pub force: bool,
}

/// External deduplicating suite scheduler.
///
/// Tasks consume this handle; the triggering core only passes it through.
#[async_trait]
pub trait SuiteScheduler: Send + Sync {
    /// Kick off a suite run. `Ok(false)` means an identical run was
    /// already queued and the request was suppressed.
    async fn schedule_suite(&self, request: &SuiteRequest) -> Result<bool, ScheduleError>;

    /// Whether hosts matching every given label exist in the lab.
    async fn hosts_exist(&self, labels: &[String]) -> Result<bool, ScheduleError>;
}

// ── Task identity ───────────────────────────────────────────────────

/// Structural identity of a task.
///
/// Logically equivalent specifications (same suite, same board filter,
/// same branch filter) compare equal, so a [`TaskSet`] collapses them
/// before anything is scheduled. Filters are sorted on construction so
/// ordering differences don't defeat de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaskKey {
    pub suite: String,
    pub boards: Vec<String>,
    pub branches: Vec<String>,
}

impl TaskKey {
    pub fn new(
        suite: impl Into<String>,
        boards: impl IntoIterator<Item = String>,
        branches: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut boards: Vec<String> = boards.into_iter().collect();
        let mut branches: Vec<String> = branches.into_iter().collect();
        boards.sort();
        branches.sort();
        Self {
            suite: suite.into(),
            boards,
            branches,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [boards: {}] [branches: {}]",
            self.suite,
            self.boards.join(","),
            self.branches.join(",")
        )
    }
}

// ── Task contract ───────────────────────────────────────────────────

/// Arguments threaded from the dispatch loop into a task's run operation.
pub struct TaskRun<'a> {
    pub scheduler: &'a dyn SuiteScheduler,
    pub branch_builds: &'a BranchBuilds,
    pub board: &'a str,
    pub force: bool,
    pub backend: &'a dyn DiscoveryBackend,
    pub launch_control_builds: Option<&'a [String]>,
}

/// A unit of work owned outside this crate.
#[async_trait]
pub trait Task: Send + Sync {
    /// Structural identity used for de-duplication in a [`TaskSet`].
    fn key(&self) -> TaskKey;

    /// Launch-control branches this task watches (empty when the task
    /// only targets the traditional build system).
    fn launch_control_branches(&self) -> &[String];

    /// Launch-control targets this task schedules against.
    fn launch_control_targets(&self) -> &[String];

    /// Whether hosts are currently available for `board`.
    async fn available_hosts(&self, scheduler: &dyn SuiteScheduler, board: &str) -> bool;

    /// Whether missing hosts make running pointless. Tasks that schedule
    /// regardless of lab capacity return false and are never warned about.
    fn should_have_available_hosts(&self) -> bool {
        true
    }

    /// Attempt to schedule the suite. `Ok(false)` marks the task
    /// one-shot: it must not fire again and is removed from its event.
    async fn run(&self, run: TaskRun<'_>) -> Result<bool, TaskRunError>;
}

// ── Task set ────────────────────────────────────────────────────────

/// De-duplicated, unordered set of tasks attached to an event.
#[derive(Clone, Default)]
pub struct TaskSet {
    tasks: HashMap<TaskKey, Arc<dyn Task>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from any iterable of tasks, collapsing duplicates.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Arc<dyn Task>>) -> Self {
        let mut set = Self::new();
        set.set_tasks(tasks);
        set
    }

    /// Replace the contents. Logically equal tasks collapse to one entry.
    pub fn set_tasks(&mut self, tasks: impl IntoIterator<Item = Arc<dyn Task>>) {
        self.tasks = tasks.into_iter().map(|t| (t.key(), t)).collect();
    }

    /// Remove one task by identity. Returns whether it was present.
    pub fn remove(&mut self, key: &TaskKey) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    /// Point-in-time copy of the tasks, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Task>> {
        self.tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Launch-control branch → accumulated targets across all tasks.
    ///
    /// Targets from multiple tasks on the same branch are concatenated,
    /// not de-duplicated; consumers must tolerate repeats.
    pub fn launch_control_branches_targets(&self) -> BTreeMap<String, Vec<String>> {
        let mut branches: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for task in self.tasks.values() {
            for branch in task.launch_control_branches() {
                branches
                    .entry(branch.clone())
                    .or_default()
                    .extend(task.launch_control_targets().iter().cloned());
            }
        }
        branches
    }
}

impl fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tasks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTask {
        key: TaskKey,
        branches: Vec<String>,
        targets: Vec<String>,
    }

    impl FakeTask {
        fn new(suite: &str) -> Arc<dyn Task> {
            Self::with_launch_control(suite, &[], &[])
        }

        fn with_launch_control(suite: &str, branches: &[&str], targets: &[&str]) -> Arc<dyn Task> {
            Arc::new(FakeTask {
                key: TaskKey::new(suite, ["shamu".to_string()], ["git_mnc_release".to_string()]),
                branches: branches.iter().map(|s| s.to_string()).collect(),
                targets: targets.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl Task for FakeTask {
        fn key(&self) -> TaskKey {
            self.key.clone()
        }

        fn launch_control_branches(&self) -> &[String] {
            &self.branches
        }

        fn launch_control_targets(&self) -> &[String] {
            &self.targets
        }

        async fn available_hosts(&self, _scheduler: &dyn SuiteScheduler, _board: &str) -> bool {
            true
        }

        async fn run(&self, _run: TaskRun<'_>) -> Result<bool, TaskRunError> {
            Ok(true)
        }
    }

    // ── TaskKey ─────────────────────────────────────────────────────

    #[test]
    fn key_equality_is_structural() {
        let a = TaskKey::new("bvt", ["x86-alex".to_string()], ["R18".to_string()]);
        let b = TaskKey::new("bvt", ["x86-alex".to_string()], ["R18".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn key_ignores_filter_ordering() {
        let a = TaskKey::new(
            "bvt",
            ["lumpy".to_string(), "x86-alex".to_string()],
            ["R18".to_string(), "R19".to_string()],
        );
        let b = TaskKey::new(
            "bvt",
            ["x86-alex".to_string(), "lumpy".to_string()],
            ["R19".to_string(), "R18".to_string()],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_on_suite() {
        let a = TaskKey::new("bvt", ["x86-alex".to_string()], Vec::new());
        let b = TaskKey::new("regression", ["x86-alex".to_string()], Vec::new());
        assert_ne!(a, b);
    }

    // ── De-duplication ──────────────────────────────────────────────

    #[test]
    fn set_tasks_collapses_duplicates() {
        let mut set = TaskSet::new();
        set.set_tasks([
            FakeTask::new("bvt"),
            FakeTask::new("bvt"),
            FakeTask::new("regression"),
        ]);
        // Two distinct specifications, three instances.
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn reassignment_replaces_contents() {
        let mut set = TaskSet::new();
        set.set_tasks([FakeTask::new("bvt")]);
        set.set_tasks([FakeTask::new("regression"), FakeTask::new("smoke")]);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&FakeTask::new("bvt").key()));
    }

    #[test]
    fn remove_targets_one_task() {
        let mut set = TaskSet::from_tasks([FakeTask::new("bvt"), FakeTask::new("smoke")]);
        assert!(set.remove(&FakeTask::new("bvt").key()));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&FakeTask::new("smoke").key()));
        assert!(!set.remove(&FakeTask::new("bvt").key()));
    }

    // ── Branch/target aggregation ───────────────────────────────────

    #[test]
    fn branches_targets_concatenates_without_dedup() {
        let set = TaskSet::from_tasks([
            FakeTask::with_launch_control("a", &["git_mnc_release"], &["shamu-eng"]),
            FakeTask::with_launch_control("b", &["git_mnc_release"], &["shamu-eng", "shamu-userdebug"]),
        ]);

        let branches = set.launch_control_branches_targets();
        assert_eq!(branches.len(), 1);

        let mut targets = branches["git_mnc_release"].clone();
        targets.sort();
        // "shamu-eng" appears twice: concatenation keeps repeats.
        assert_eq!(targets, vec!["shamu-eng", "shamu-eng", "shamu-userdebug"]);
    }

    #[test]
    fn branches_targets_empty_for_traditional_tasks() {
        let set = TaskSet::from_tasks([FakeTask::new("bvt")]);
        assert!(set.launch_control_branches_targets().is_empty());
    }
}
