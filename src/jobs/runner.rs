use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

use super::job::{Job, JobStatus, JobUpdate};
use super::registry::JobRegistry;

/// File extension a path must have to be runnable.
pub const SCRIPT_EXTENSION: &str = "py";

/// Wall-clock limit for a single script run.
const EXECUTION_TIMEOUT: Duration = Duration::from_secs(300);

const TIMEOUT_ERROR: &str = "Script execution timed out (5 min limit)";

/// Captured output is cut after this many lines.
const MAX_OUTPUT_LINES: usize = 20;

/// Two-stage launcher prefix: the environment manager invoking the
/// interpreter. Scripts run as `uv run python <script> <args...>`.
const DEFAULT_LAUNCHER: &[&str] = &["uv", "run", "python"];

pub fn is_script(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION)
}

/// Validation errors surfaced synchronously at submit time. Execution faults
/// are captured asynchronously into the job record instead.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Script does not exist")]
    ScriptNotFound,
    #[error("Not a Python file")]
    InvalidScriptType,
}

/// Launches a process for a job and finalizes its terminal state.
///
/// `submit` returns the job id immediately; the launch, wait and output
/// capture happen on a detached tokio task. There is no bound on the number
/// of simultaneously running jobs, each has its own timeout clock.
#[derive(Clone)]
pub struct JobRunner {
    registry: JobRegistry,
    launcher: Vec<String>,
    timeout: Duration,
}

impl JobRunner {
    pub fn new(registry: JobRegistry) -> Self {
        Self {
            registry,
            launcher: DEFAULT_LAUNCHER.iter().map(|s| s.to_string()).collect(),
            timeout: EXECUTION_TIMEOUT,
        }
    }

    /// Replace the launcher prefix, e.g. to invoke the interpreter directly
    /// without the environment manager indirection.
    pub fn with_launcher(mut self, launcher: Vec<String>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the request, create a `running` record and spawn the
    /// execution task. No record is created when validation fails.
    pub fn submit(&self, script_path: &str, raw_args: &str) -> Result<String, SubmitError> {
        let script = PathBuf::from(script_path);
        if !script.exists() {
            return Err(SubmitError::ScriptNotFound);
        }
        if !is_script(&script) {
            return Err(SubmitError::InvalidScriptType);
        }

        let mut cmd: Vec<String> = self.launcher.clone();
        cmd.push(script.to_string_lossy().into_owned());
        cmd.extend(split_args(raw_args));

        let id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let job = Job {
            id: id.clone(),
            status: JobStatus::Running,
            script: script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| script_path.to_string()),
            script_path: script.to_string_lossy().into_owned(),
            args: raw_args.to_string(),
            command: cmd.join(" "),
            started: Utc::now(),
            finished: None,
            returncode: None,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        };
        info!("Starting job {}: {}", id, job.command);
        self.registry.create(job);

        let runner = self.clone();
        let job_id = id.clone();
        let workdir = script
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::spawn(async move {
            runner.execute(&job_id, cmd, workdir).await;
        });

        Ok(id)
    }

    /// Task body for one job. Every fault ends up in the job record, this
    /// never takes the service down.
    async fn execute(&self, id: &str, cmd: Vec<String>, workdir: PathBuf) {
        let Some((program, args)) = cmd.split_first() else {
            return;
        };

        // kill_on_drop tears the child down when the timeout drops the
        // output future.
        let output = Command::new(program)
            .args(args)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let update = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => {
                let status = if output.status.success() {
                    JobStatus::Success
                } else {
                    JobStatus::Failed
                };
                info!("Job {} finished: {}", id, output.status);
                JobUpdate {
                    status: Some(status),
                    finished: Some(Utc::now()),
                    returncode: output.status.code(),
                    stdout: Some(truncate_output(&String::from_utf8_lossy(&output.stdout))),
                    stderr: Some(truncate_output(&String::from_utf8_lossy(&output.stderr))),
                    error: None,
                }
            }
            Ok(Err(err)) => {
                error!("Job {} failed to run: {}", id, err);
                JobUpdate {
                    status: Some(JobStatus::Failed),
                    finished: Some(Utc::now()),
                    error: Some(err.to_string()),
                    ..Default::default()
                }
            }
            Err(_) => {
                error!("Job {} timed out after {:?}", id, self.timeout);
                JobUpdate {
                    status: Some(JobStatus::Failed),
                    finished: Some(Utc::now()),
                    error: Some(TIMEOUT_ERROR.to_string()),
                    ..Default::default()
                }
            }
        };
        self.registry.update(id, update);
    }
}

/// Shell-style tokenization of the raw argument string. Quoting is honored,
/// nothing is ever passed to a shell. Unbalanced quoting falls back to a
/// plain whitespace split.
fn split_args(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    shlex::split(raw).unwrap_or_else(|| raw.split_whitespace().map(String::from).collect())
}

/// Keep the first [`MAX_OUTPUT_LINES`] lines of `text`, preserving original
/// line terminators, and append a marker with the original line count.
/// Shorter text passes through unchanged.
pub fn truncate_output(text: &str) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    if lines.len() <= MAX_OUTPUT_LINES {
        return text.to_string();
    }
    let mut truncated: String = lines[..MAX_OUTPUT_LINES].concat();
    truncated.push_str(&format!(
        "\n... (truncated, showing first {} of {} lines)",
        MAX_OUTPUT_LINES,
        lines.len()
    ));
    truncated
}
