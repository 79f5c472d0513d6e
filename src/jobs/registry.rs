use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::job::{Job, JobStatus, JobUpdate};

/// In-memory store of every job created during the service's uptime.
///
/// Cheap to clone, all clones share the same map. Jobs are never evicted,
/// the map grows for the lifetime of the process. Each job has a single
/// writer (its runner task), the mutex only has to make insert, update and
/// reads safe against each other; it is never held across an await point.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job record. The caller guarantees id uniqueness.
    pub fn create(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id.clone(), job);
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    /// Merge terminal fields into an existing record.
    ///
    /// A job that already reached a terminal status is never written again.
    pub(crate) fn update(&self, id: &str, update: JobUpdate) {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id) else {
            warn!("Dropping update for unknown job {}", id);
            return;
        };
        if job.status != JobStatus::Running {
            warn!("Dropping update for already finished job {}", id);
            return;
        }
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(finished) = update.finished {
            job.finished = Some(finished);
        }
        if let Some(returncode) = update.returncode {
            job.returncode = Some(returncode);
        }
        if let Some(stdout) = update.stdout {
            job.stdout = stdout;
        }
        if let Some(stderr) = update.stderr {
            job.stderr = stderr;
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
    }

    /// Up to `n` jobs ordered by start time descending, most recent first.
    pub fn list_recent(&self, n: usize) -> Vec<Job> {
        let jobs = self.jobs.lock().unwrap();
        let mut recent: Vec<Job> = jobs.values().cloned().collect();
        recent.sort_by(|a, b| b.started.cmp(&a.started));
        recent.truncate(n);
        recent
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().unwrap().is_empty()
    }
}
