//! Ingest Runtime
//!
//! Polls every configured game server and ingests its logs:
//! - Applies the SQLite schema
//! - Spawns the scheduler (one pass per target every tick)
//! - Stops on CTRL+C after the running tick finishes
//!
//! Usage:
//!   cargo run --release --bin ingest_runtime
//!
//! Environment variables:
//!   SCUMFLOW_DB_PATH - SQLite database path (default: scumflow.db)
//!   SCUMFLOW_LOGS_DIR - Local log cache (default: Logs)
//!   POLL_INTERVAL_SECS - Tick interval (default: 20)
//!   STEAM_WEB_API_KEY - Enables ban lookups on login (optional)
//!   ENABLE_INGEST - Master switch (default: true)
//!   RUST_LOG / SCUMFLOW_LOG_LEVEL - Log filter (default: info)

use dotenv::dotenv;
use log::{error, info};
use scumflow::pipeline::{IngestConfig, IngestContext, Scheduler};
use scumflow::store::SqliteStore;
use std::env;
use std::sync::Arc;
use tokio::sync::watch;

fn init_logging() {
    let default_level = env::var("SCUMFLOW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .filter_module("suppaftp", log::LevelFilter::Warn)
        .filter_module("ssh2", log::LevelFilter::Warn)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("hyper_util", log::LevelFilter::Warn)
        .filter_module("rustls", log::LevelFilter::Warn)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize environment and logging
    dotenv().ok();
    init_logging();

    info!("🚀 SCUM Log Ingest Runtime");
    info!("   └─ Version: {}", env!("CARGO_PKG_VERSION"));

    let config = IngestConfig::from_env();

    if !config.enabled {
        info!("⚠️  Ingest is DISABLED (set ENABLE_INGEST=true to activate)");
        info!("   └─ Exiting gracefully...");
        return Ok(());
    }
    config.validate()?;

    info!("✅ Ingest ENABLED");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Log cache: {}", config.logs_dir.display());
    info!("   ├─ Poll interval: {}s", config.poll_interval_secs);
    info!(
        "   ├─ Timeouts: primary FTP {}s, SFTP {}s, safe FTP connect {}s",
        config.primary_ftp_timeout_secs,
        config.sftp_timeout_secs,
        config.safe_ftp_connect_timeout_secs
    );
    info!("   ├─ FTP backoff: {}h", config.ftp_backoff_secs / 3600);
    info!("   └─ Steam Web API key configured: {}", config.steam_api_key.is_some());

    // Initialize database (schema migrations are idempotent)
    info!("🔧 Initializing database...");
    let store = SqliteStore::open(&config.db_path, &config.schema_dir)?;
    std::fs::create_dir_all(&config.logs_dir)?;
    info!("✅ Database initialized");

    let ctx = Arc::new(IngestContext::with_store(config, store));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(ctx);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));
    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("");
            info!("⚠️  Received CTRL+C, finishing the current tick...");
        }
        Err(err) => {
            error!("❌ Failed to listen for CTRL+C: {}", err);
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        error!("❌ Scheduler task failed: {}", e);
    }

    info!("✅ Ingest runtime stopped");
    Ok(())
}
