//! Dependency-injected HTTP service (v1)
//!
//! Wires a small HTTP service through a runtime dependency container.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        COMPOSITION ROOT                      │
//!   │                                                              │
//!   │   config ──▶ container::ContainerBuilder                     │
//!   │                 │  provide: config, logger, server,          │
//!   │                 │           route table, controllers,        │
//!   │                 │           shutdown token                   │
//!   │                 │  invoke:  start_server                     │
//!   │                 ▼                                            │
//!   │           Container (Running) ──▶ wait for Shutdown          │
//!   │                 │                                            │
//!   │                 ▼                                            │
//!   │           cleanup (reverse construction order)               │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use di_bootstrap::config::resolve_config;
use di_bootstrap::lifecycle::startup;
use di_bootstrap::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "di-bootstrap")]
#[command(about = "HTTP service assembled by a dependency container", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.bind)?;

    logging::init(&config.observability.log_filter);

    tracing::info!("di-bootstrap v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let report = startup::run(config).await?;
    if !report.is_clean() {
        for failure in &report.failures {
            tracing::warn!(provider = %failure.provider, error = %failure.error, "Release failed");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
