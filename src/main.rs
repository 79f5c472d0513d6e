use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scriptboard::jobs::{JobRegistry, JobRunner};
use scriptboard::server::{run_server, ServerConfig};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory to start browsing in. Falls back to the user's home
    /// directory when unset or invalid.
    pub root: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Path to a frontend directory to be statically served instead of the
    /// embedded page.
    #[clap(long)]
    pub frontend_dir: Option<String>,
}

fn resolve_base_dir(root: Option<PathBuf>) -> PathBuf {
    if let Some(root) = root {
        match root.canonicalize() {
            Ok(resolved) if resolved.is_dir() => return resolved,
            _ => warn!("Ignoring invalid root directory {:?}", root),
        }
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let config = ServerConfig {
        port: cli_args.port,
        base_dir: resolve_base_dir(cli_args.root),
        frontend_dir_path: cli_args.frontend_dir,
    };
    info!("Browsing root: {:?}", config.base_dir);

    let registry = JobRegistry::new();
    let runner = JobRunner::new(registry.clone());

    info!("Ready to serve at port {}!", config.port);
    run_server(config, registry, runner).await
}
