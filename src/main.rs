//! Onco-Insight - cancer risk prediction service
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP API (loads the saved model or trains the demo model)
//! cargo run --release
//!
//! # Run the synthetic end-to-end training demo
//! cargo run --release -- demo
//!
//! # Train the serving model from a CSV file
//! cargo run --release -- train --csv data/patients.csv --target diagnosis
//! ```
//!
//! # Environment Variables
//!
//! - `ONCO_ADDR`: Override the server bind address
//! - `ONCO_CONFIG`: Path to a TOML config file
//! - `ONCO_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use onco_insight::api::{create_app, ApiState};
use onco_insight::service::{self, TrainingReport};
use onco_insight::{PredictionService, ServiceConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "onco-insight")]
#[command(about = "Onco-Insight cancer risk prediction service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long, env = "ONCO_ADDR")]
    addr: Option<String>,

    /// Path to a TOML config file (otherwise ./service_config.toml or defaults)
    #[arg(short, long, env = "ONCO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP API (default)
    Serve,

    /// Train and evaluate on synthetic data, saving results under results_dir
    Demo,

    /// Train the serving model from a CSV file
    Train {
        /// Path to the CSV file (header row required)
        #[arg(long)]
        csv: PathBuf,
        /// Name of the binary target column (default: data.target_column)
        #[arg(long)]
        target: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServiceConfig::load(),
    };
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    config.validate().context("Invalid configuration")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Onco-Insight v{}", env!("CARGO_PKG_VERSION"));
    info!("  Gradient-boosted cancer risk prediction");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match args.command.unwrap_or(SubCommand::Serve) {
        SubCommand::Serve => run_server(config).await,
        SubCommand::Demo => {
            let report = tokio::task::spawn_blocking(move || service::run_demo(&config))
                .await
                .context("Demo task panicked")??;
            print_report("Demo Pipeline", &report);
            Ok(())
        }
        SubCommand::Train { csv, target } => {
            let target = target.unwrap_or_else(|| config.data.target_column.clone());
            let report = tokio::task::spawn_blocking(move || service::run_csv(&config, &csv, &target))
                .await
                .context("Training task panicked")??;
            print_report("CSV Training", &report);
            Ok(())
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(config: ServiceConfig) -> Result<()> {
    let addr = config.server.addr.clone();
    let service = Arc::new(PredictionService::new(config));

    info!("📦 Loading model...");
    let loader = Arc::clone(&service);
    tokio::task::spawn_blocking(move || loader.load_or_bootstrap())
        .await
        .context("Model loading task panicked")??;
    info!("✓ Model ready");

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Received Ctrl+C, initiating shutdown...");
            ctrl_c_token.cancel();
        } else {
            warn!("Failed to install Ctrl+C handler");
        }
    });

    info!("🌐 Starting HTTP server on {}...", addr);
    let app = create_app(ApiState::new(service));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("✓ HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("HTTP server shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}

// ============================================================================
// Reporting
// ============================================================================

fn print_report(title: &str, report: &TrainingReport) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  {} complete", title);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Samples: {}  Features: {}  Trees: {}", report.samples, report.features, report.n_trees);
    if let Some(best) = report.best_iteration {
        info!("Early stopping kept {} rounds", best + 1);
    }

    info!("Held-out metrics:");
    for line in report.metrics.to_string().lines() {
        info!("  {}", line);
    }

    info!("Top {} features:", report.top_features.len());
    for (rank, (name, score)) in report.top_features.iter().enumerate() {
        info!("  {:>2}. {:<20} {:.4}", rank + 1, name, score);
    }

    for (i, sample) in report.samples_scored.iter().enumerate() {
        info!(
            "Sample {}: actual={} predicted={} p(positive)={:.3}",
            i + 1,
            sample.actual,
            sample.predicted,
            sample.probabilities.class_1
        );
    }

    info!("Model saved to {}", report.model_path.display());
    if let Some(path) = &report.metrics_path {
        info!("Metrics saved to {}", path.display());
    }
}
