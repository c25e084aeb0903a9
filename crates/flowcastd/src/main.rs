//! flowcastd — the flowcast daemon.
//!
//! Loads the exported LSTM model and fitted scaler once, then serves
//! vehicle-count forecasts over HTTP.
//!
//! # Usage
//!
//! ```text
//! flowcastd serve --config flowcast.toml --port 8000
//! flowcastd check --artifacts-dir ./prediction_api
//! flowcastd serve --log-json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use flow_core::FlowConfig;
use flowcast_api::{ApiState, build_router};
use flowcast_model::{load_model, load_scaler};
use flowcast_pipeline::PredictionPipeline;

#[derive(Parser)]
#[command(name = "flowcastd", about = "Vehicle-count forecast daemon")]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the artifacts and serve the prediction API.
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Inference timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Load and validate the artifacts, then exit.
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to flowcast.toml. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the model and scaler artifacts.
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,
}

impl CommonArgs {
    fn resolve(&self) -> anyhow::Result<FlowConfig> {
        let mut config = match &self.config {
            Some(path) => FlowConfig::from_file(path)?,
            None => FlowConfig::default(),
        };
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts.dir = dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,flowcastd=debug,flowcast=debug".into());
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Serve {
            common,
            port,
            timeout_ms,
        } => {
            let mut config = common.resolve()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(ms) = timeout_ms {
                config.inference.timeout_ms = ms;
            }
            run_server(config).await
        }
        Command::Check { common } => check(&common.resolve()?),
    }
}

async fn run_server(config: FlowConfig) -> anyhow::Result<()> {
    info!(dir = %config.artifacts.dir.display(), "flowcast daemon starting");

    let pipeline = PredictionPipeline::load(&config.artifacts);
    if !pipeline.is_available() {
        warn!("serving without a model; every prediction will fail until restart");
    }

    let state = ApiState::new(pipeline, config.inference.timeout());
    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, timeout_ms = config.inference.timeout_ms, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("flowcast daemon stopped");
    Ok(())
}

fn check(config: &FlowConfig) -> anyhow::Result<()> {
    let artifacts = &config.artifacts;
    let model = load_model(&artifacts.model_path(), artifacts.model_sha256.as_deref())?;
    let scaler = load_scaler(&artifacts.scaler_path(), artifacts.scaler_sha256.as_deref())?;

    println!("model   {}  {}", model.sha256, artifacts.model_path().display());
    println!("scaler  {}  {}", scaler.sha256, artifacts.scaler_path().display());
    Ok(())
}
