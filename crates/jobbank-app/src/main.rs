//! # Job Bank - Reference data maintenance server
//!
//! This is the main entry point that wires everything together.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  main.rs (this file) - Dependency Injection & Wiring           │
//! │    │                                                            │
//! │    ├── Loads: AppConfig (file + CLI overrides)                 │
//! │    ├── Creates: Database + SqliteEntityStore (adapter)         │
//! │    ├── Creates: EntityController per entity (usecase)          │
//! │    └── Runs: axum router until Ctrl-C                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobbank_adapter::{router, CookieSettings, Database};
use jobbank_usecase::EntityController;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "jobbank")]
#[command(about = "Job Bank - Skills and Retraining Programs maintenance")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "JOBBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, env = "JOBBANK_DATABASE_URL")]
    database_url: Option<String>,

    /// Listen address (overrides the config file)
    #[arg(short, long, env = "JOBBANK_LISTEN")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?
        .with_overrides(cli.database_url, cli.listen);

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Job Bank starting");

    // ========================================
    // Dependency Injection - Wire up the system
    // ========================================

    let policy = Arc::new(config.access_policy()?);
    info!(roles = ?policy.allowed().collect::<Vec<_>>(), "Reference data restricted to roles");

    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    db.migrate().await?;

    let skills = EntityController::from_shared(Arc::new(db.skills()), Arc::clone(&policy));
    let programs =
        EntityController::from_shared(Arc::new(db.retraining_programs()), Arc::clone(&policy));

    let app = router(
        skills,
        programs,
        CookieSettings {
            secure: config.secure_cookies,
        },
    );

    // ========================================
    // Serve
    // ========================================

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("HTTP server listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Job Bank stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
