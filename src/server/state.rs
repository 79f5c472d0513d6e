use axum::extract::FromRef;

use super::ServerConfig;
use crate::jobs::{JobRegistry, JobRunner};

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub registry: JobRegistry,
    pub runner: JobRunner,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for JobRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.registry.clone()
    }
}

impl FromRef<ServerState> for JobRunner {
    fn from_ref(input: &ServerState) -> Self {
        input.runner.clone()
    }
}
