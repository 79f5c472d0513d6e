//! Scriptboard - a web-based file browser for running Python scripts.
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod browse;
pub mod jobs;
pub mod server;

// Re-export commonly used types for convenience
pub use jobs::{Job, JobRegistry, JobRunner, JobStatus};
pub use server::{make_app, run_server, ServerConfig};
