use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of a job. Transitions only `Running` -> `Success` or
/// `Running` -> `Failed`, exactly once.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Success,
    Failed,
}

/// One tracked asynchronous script execution and its outcome.
///
/// A nonzero exit is reported as `Failed` with `returncode` set and `error`
/// unset; an internal fault (timeout, launch failure) is `Failed` with
/// `error` set and `returncode` unset. Callers distinguish the two by field
/// presence.
#[derive(Clone, Debug, Serialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Display name of the script (file name only).
    pub script: String,
    pub script_path: String,
    /// Raw argument string as submitted.
    pub args: String,
    /// Fully assembled command line, for display and audit.
    pub command: String,
    pub started: DateTime<Utc>,
    /// Set if and only if the job reached a terminal status.
    pub finished: Option<DateTime<Utc>>,
    pub returncode: Option<i32>,
    /// Captured standard output, possibly truncated.
    pub stdout: String,
    /// Captured standard error, possibly truncated.
    pub stderr: String,
    pub error: Option<String>,
}

/// Partial terminal fields merged into a job record by its runner task.
#[derive(Debug, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub finished: Option<DateTime<Utc>>,
    pub returncode: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub error: Option<String>,
}
