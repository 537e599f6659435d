//! Ingest pipeline: scheduler → per-target pass → scan → parse → commit
//!
//! ## Flow
//!
//! ```text
//! Scheduler (every POLL_INTERVAL_SECS)
//!   └─ one task per configured target (TargetHandle::run_pass)
//!        ├─ TransportSelector::choose
//!        ├─ Connector::connect → RemoteFs
//!        └─ scan_remote
//!             └─ per changed file: fetch → parse_file → EventSink::commit_batch
//! ```
//!
//! Each target task is strictly sequential; tasks for different targets run
//! concurrently and share nothing except the store.

pub mod config;
pub mod scanner;
pub mod scheduler;
pub mod target_task;
pub mod throttle;

pub use config::{ConfigError, IngestConfig};
pub use scanner::{ingest_file, scan_remote, ScanStats};
pub use scheduler::{Scheduler, TickReport};
pub use target_task::{PassReport, TargetHandle};
pub use throttle::WarnThrottle;

use crate::parser::ParseError;
use crate::steam_bans::BanScanner;
use crate::store::{CheckpointStore, EventSink, SqliteStore, StoreError, TargetSource};
use crate::transport::{Connector, NetworkConnector, TransportError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything a target pass needs, shared by all tasks of the process
pub struct IngestContext {
    pub config: IngestConfig,
    pub targets: Arc<dyn TargetSource>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub sink: Arc<dyn EventSink>,
    pub connector: Arc<dyn Connector>,
    /// Present when a Steam Web API key is configured
    pub bans: Option<BanScanner>,
}

impl IngestContext {
    /// Production wiring: one SQLite store behind every store trait
    pub fn with_store(config: IngestConfig, store: SqliteStore) -> Self {
        let bans = config.steam_api_key.clone().and_then(|key| {
            BanScanner::new(key, store.clone())
                .map_err(|e| log::warn!("⚠️  Ban lookups disabled: {}", e))
                .ok()
        });
        let connector = NetworkConnector {
            connect_timeout: config.safe_ftp_connect_timeout(),
        };
        let store = Arc::new(store);

        Self {
            config,
            targets: store.clone(),
            checkpoints: store.clone(),
            sink: store,
            connector: Arc::new(connector),
            bans,
        }
    }
}
