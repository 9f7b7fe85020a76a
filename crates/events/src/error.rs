//! Error taxonomy for the triggering core.
//!
//! Host unavailability is deliberately absent: it is an expected, logged,
//! non-fatal skip, not an error (see the dispatch loop).

use thiserror::Error;

/// Build-metadata or discovery-backend lookup failure.
///
/// Never retried at this layer; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum BuildLookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("build server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("malformed response from {server} for key '{build_key}'")]
    MalformedResponse { server: String, build_key: String },

    #[error("build server pool is empty")]
    EmptyPool,

    #[error("discovery backend error: {0}")]
    Backend(String),
}

/// External suite-scheduler failure, surfaced to tasks through the
/// pass-through handle.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduler rejected request: {0}")]
    Rejected(String),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// A task's run operation failed outright (distinct from the "do not
/// keep" signal, which is a normal return).
#[derive(Debug, Error)]
#[error("task '{task}' failed on {board}: {reason}")]
pub struct TaskRunError {
    pub task: String,
    pub board: String,
    pub reason: String,
}

impl TaskRunError {
    pub fn new(
        task: impl Into<String>,
        board: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            board: board.into(),
            reason: reason.into(),
        }
    }
}
