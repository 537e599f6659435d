//! Relational store: checkpoints, facts, aggregates and target rows
//!
//! Backed by one SQLite connection guarded by a mutex. Every parsed batch is
//! committed in a single transaction together with its checkpoint, so facts,
//! aggregates and the cursor move together or not at all.

pub mod bans;
pub mod checkpoints;
pub mod persister;
pub mod registration;
pub mod schema;
pub mod targets;

pub use bans::BanRecord;
pub use checkpoints::CheckpointStore;
pub use persister::{CommitSummary, EventSink};
pub use schema::run_schema_migrations;
pub use targets::TargetSource;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// SQLite implementation of every store-facing trait in this crate
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database and apply the schema
    pub fn open(db_path: impl AsRef<Path>, schema_dir: &str) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(db_path)?;
        run_schema_migrations(&mut conn, schema_dir)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema is already in place
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}
