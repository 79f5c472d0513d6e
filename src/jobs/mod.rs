//! Job execution and tracking.
//!
//! A run request creates a [`Job`] record in the [`JobRegistry`] and hands it
//! to the [`JobRunner`], which executes the script on a detached task while
//! the caller polls the registry for completion.

mod job;
mod registry;
mod runner;

pub use job::{Job, JobStatus};
pub use registry::JobRegistry;
pub use runner::{is_script, truncate_output, JobRunner, SubmitError, SCRIPT_EXTENSION};
