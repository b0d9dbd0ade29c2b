//! Culvert precipitation API server
//!
//! Hourly precipitation, flow and water level for culvert sites.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use culvert_api::build_router;
use culvert_api::config::ServiceConfig;
use culvert_api::state::AppState;

/// Culvert precipitation API server
#[derive(Parser, Debug)]
#[command(name = "culvert-api")]
#[command(about = "Hourly precipitation, flow and water level for culvert sites")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "CULVERT_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "CULVERT_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Service configuration file
    #[arg(short, long, default_value = "config/culvert.yaml", env = "CULVERT_CONFIG")]
    config: PathBuf,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    info!("Starting culvert API server");

    let config = ServiceConfig::load(&args.config)?;
    let state = Arc::new(AppState::new(config).context("Failed to initialize application state")?);

    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Culvert API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
