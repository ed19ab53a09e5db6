//! ==============================================================================
//! main.rs - dashboard host entry point
//! ==============================================================================
//!
//! purpose:
//!     polls the sensor deployment sheet and serves the status dashboard.
//!
//! responsibilities:
//!     - load configuration (dashboard.toml or defaults)
//!     - set up tracing (RUST_LOG wins over the configured level)
//!     - build the configured sheet source
//!     - start the refresh coordinator timer (5 minute default)
//!     - serve the dashboard until ctrl-c, then stop the timer
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                    dashboard host                        │
//!     │  ┌──────────────┐      ┌──────────────────────────────┐  │
//!     │  │ refresh timer│      │ web server (port 3000)       │  │
//!     │  │ (5 min tick) │      │ html / json / csv export     │  │
//!     │  └──────┬───────┘      └──────────────┬───────────────┘  │
//!     │         │  writes              reads  │                  │
//!     │         └──────────┬──────────────────┘                  │
//!     │             ┌──────┴──────┐                              │
//!     │             │ coordinator │ <- refresh.rs                │
//!     │             └──────┬──────┘                              │
//!     └────────────────────┼─────────────────────────────────────┘
//!                          │ fetch
//!               ┌──────────┴───────────┐
//!               │ sheet csv / sheets   │ <- source.rs
//!               │ api / local file     │
//!               └──────────────────────┘
//!
//! ==============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deploy_dash::config::{ConfigOrigin, DashboardConfig};
use deploy_dash::render::PageOptions;
use deploy_dash::server::{self, AppState};
use deploy_dash::{RefreshCoordinator, SheetSource};

#[derive(Parser, Debug)]
#[command(name = "deploy-dash")]
#[command(about = "Sensor deployment status dashboard")]
struct Args {
    /// Path to dashboard.toml (default: config/dashboard.toml, then ../config/dashboard.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // step 1: load configuration
    let (config, origin) = match &args.config {
        Some(path) => (DashboardConfig::load(path)?, ConfigOrigin::File(path.clone())),
        None => DashboardConfig::load_or_default(),
    };

    // step 2: logging
    init_tracing(&config.logging.level);
    info!("===========================================================");
    info!("  Sensor Deployment Status Dashboard");
    info!("===========================================================");
    config.log_summary(&origin);

    // step 3: coordinator + auto-refresh timer (first fetch happens now)
    let source = SheetSource::new(config.source.clone(), config.polling.timeout());
    let coordinator = RefreshCoordinator::new(source);
    let timer = coordinator.spawn(config.polling.interval());

    // step 4: web server
    let state = AppState {
        coordinator,
        export_base: config.export.base_name.clone(),
        page: PageOptions { dark_mode: config.ui.dark_mode },
    };
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!("[STARTUP] ✓ Dashboard live at http://{}", listener.local_addr()?);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // step 5: teardown - no refresh fires after this
    timer.shutdown();
    info!("[SHUTDOWN] refresh timer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[SHUTDOWN] could not listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("[SHUTDOWN] ctrl-c received");
}
