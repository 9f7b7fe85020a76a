//! [`EventCore`] — the state and behavior every event variant shares.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use cadence_core::{names, BoardAliases, ConfigError, SectionedConfig};

use crate::devserver::ServerPool;
use crate::discovery::{BranchBuilds, DiscoveryBackend};
use crate::error::{BuildLookupError, TaskRunError};
use crate::task::{SuiteScheduler, Task, TaskKey, TaskRun, TaskSet};

use super::report::{DispatchReport, FailurePolicy};

/// The mutable trio every event carries: replaced wholesale by
/// [`EventCore::merge`] on config reload.
#[derive(Clone)]
struct EventState {
    tasks: TaskSet,
    backend: Arc<dyn DiscoveryBackend>,
    always_handle: bool,
}

/// Shared state of a scheduler event.
///
/// The keyword is immutable for the life of the event; the task set,
/// discovery-backend handle, and always-handle flag live behind a single
/// `RwLock` so config-reload merges and dispatch removals serialize
/// against each other while candidate computation works on snapshots.
pub struct EventCore {
    keyword: String,
    policy: FailurePolicy,
    state: RwLock<EventState>,
}

impl fmt::Debug for EventCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EventCore");
        s.field("keyword", &self.keyword).field("policy", &self.policy);
        match self.state.read() {
            Ok(state) => {
                s.field("tasks", &state.tasks)
                    .field("always_handle", &state.always_handle);
            }
            Err(_) => {
                s.field("state", &"<poisoned>");
            }
        }
        s.finish()
    }
}

impl EventCore {
    pub fn new(
        keyword: impl Into<String>,
        backend: Arc<dyn DiscoveryBackend>,
        always_handle: bool,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            policy: FailurePolicy::default(),
            state: RwLock::new(EventState {
                tasks: TaskSet::new(),
                backend,
                always_handle,
            }),
        }
    }

    /// Construct from the event's `<keyword>_params` config section.
    ///
    /// Only `always_handle` is recognized at this layer; variants parse
    /// their extra options from the same section before calling this.
    /// Missing or malformed config propagates uncaught.
    pub fn from_config(
        keyword: &str,
        config: &SectionedConfig,
        backend: Arc<dyn DiscoveryBackend>,
    ) -> Result<Self, ConfigError> {
        let section = names::section_name(keyword);
        let always_handle = config.get_bool(&section, "always_handle")?;
        Ok(Self::new(keyword, backend, always_handle))
    }

    /// Override the dispatch failure policy (default: fail fast).
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn always_handle(&self) -> bool {
        self.state.read().unwrap().always_handle
    }

    /// Current discovery-backend handle.
    pub fn backend(&self) -> Arc<dyn DiscoveryBackend> {
        Arc::clone(&self.state.read().unwrap().backend)
    }

    /// Replace the task set; duplicates collapse by task identity.
    pub fn set_tasks(&self, tasks: impl IntoIterator<Item = Arc<dyn Task>>) {
        self.state.write().unwrap().tasks.set_tasks(tasks);
    }

    pub fn task_count(&self) -> usize {
        self.state.read().unwrap().tasks.len()
    }

    pub fn contains_task(&self, key: &TaskKey) -> bool {
        self.state.read().unwrap().tasks.contains(key)
    }

    /// Point-in-time copy of the task set.
    pub fn tasks_snapshot(&self) -> Vec<Arc<dyn Task>> {
        self.state.read().unwrap().tasks.snapshot()
    }

    /// Aggregated launch-control branch → targets view over all tasks.
    pub fn launch_control_branches_targets(
        &self,
    ) -> std::collections::BTreeMap<String, Vec<String>> {
        self.state
            .read()
            .unwrap()
            .tasks
            .launch_control_branches_targets()
    }

    /// Adopt `other`'s task set, backend handle, and always-handle flag.
    ///
    /// The keyword is preserved so references held to this event stay
    /// valid across config reloads. Takes the write lock, making the
    /// merge exclusive against in-flight dispatch on this event.
    pub fn merge(&self, other: &EventCore) {
        let incoming = other.state.read().unwrap().clone();
        *self.state.write().unwrap() = incoming;
    }

    /// Latest launch-control builds for `board`, resolved through one
    /// load-balanced pick from `pool`.
    ///
    /// The board is first translated through `aliases`; for each branch
    /// in the aggregated view, only targets whose board component matches
    /// are queried (one lookup per surviving target). The result may
    /// contain duplicates when tasks reference overlapping targets;
    /// dispatch downstream is idempotent, so callers tolerate them.
    pub async fn latest_builds_for_board(
        &self,
        board: &str,
        pool: &ServerPool,
        aliases: &BoardAliases,
    ) -> Result<Vec<String>, BuildLookupError> {
        let board = aliases.translate(board);
        let server = pool.pick()?;
        tracing::debug!(
            keyword = %self.keyword,
            board,
            server = server.name(),
            "resolving latest launch-control builds"
        );

        let mut builds = Vec::new();
        for (branch, targets) in self.launch_control_branches_targets() {
            let matching = targets
                .iter()
                .filter(|t| names::parse_target(t).is_some_and(|(b, _)| b == board));
            for target in matching {
                let key = names::latest_build_key(&branch, target);
                builds.push(server.translate(&key).await?);
            }
        }
        Ok(builds)
    }

    /// Run every candidate task that can be meaningfully dispatched.
    ///
    /// Called by [`Event::handle`](super::Event::handle) with the
    /// already-computed candidate list (filtered or forced). Tasks whose
    /// run operation returns `Ok(false)` are one-shot: their removal is
    /// queued and applied under the write lock after the loop, so the
    /// lock is never held across a task's network-bound run.
    pub async fn dispatch(
        &self,
        candidates: Vec<Arc<dyn Task>>,
        scheduler: &dyn SuiteScheduler,
        branch_builds: &BranchBuilds,
        board: &str,
        force: bool,
        launch_control_builds: Option<&[String]>,
    ) -> Result<DispatchReport, TaskRunError> {
        let started = Instant::now();
        tracing::info!(
            keyword = %self.keyword,
            board,
            force,
            candidates = candidates.len(),
            "handling event"
        );

        let backend = self.backend();
        let mut report = DispatchReport::default();
        let mut removals: Vec<TaskKey> = Vec::new();
        let mut failure: Option<TaskRunError> = None;

        for task in candidates {
            let key = task.key();
            if task.available_hosts(scheduler, board).await {
                let run = TaskRun {
                    scheduler,
                    branch_builds,
                    board,
                    force,
                    backend: backend.as_ref(),
                    launch_control_builds,
                };
                match task.run(run).await {
                    Ok(keep) => {
                        report.ran.push(key.clone());
                        if !keep {
                            removals.push(key);
                        }
                    }
                    Err(error) => match self.policy {
                        FailurePolicy::FailFast => {
                            failure = Some(error);
                            break;
                        }
                        FailurePolicy::Isolate => {
                            tracing::warn!(
                                keyword = %self.keyword,
                                board,
                                task = %key,
                                error = %error,
                                "task failed, continuing with remaining candidates"
                            );
                            report.failed.push((key, error.to_string()));
                        }
                    },
                }
            } else if task.should_have_available_hosts() {
                tracing::warn!(
                    keyword = %self.keyword,
                    board,
                    task = %key,
                    "skipping task, no hosts available"
                );
                report.skipped_no_hosts.push(key);
            } else {
                // Hosts are irrelevant to this task; the skip must still
                // be visible to operators.
                tracing::debug!(
                    keyword = %self.keyword,
                    board,
                    task = %key,
                    "task requires no hosts, nothing to dispatch"
                );
                report.skipped_hostless.push(key);
            }
        }

        // One-shot tasks earned their removal even when a later candidate
        // failed; apply before propagating.
        if !removals.is_empty() {
            let mut state = self.state.write().unwrap();
            for key in &removals {
                state.tasks.remove(key);
            }
        }
        report.removed = removals;

        if let Some(error) = failure {
            return Err(error);
        }

        tracing::info!(
            keyword = %self.keyword,
            board,
            ran = report.ran.len(),
            removed = report.removed.len(),
            skipped = report.skipped_no_hosts.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "dispatch complete"
        );
        Ok(report)
    }
}
