//! Ingest configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Configuration for the ingest runtime
///
/// Remote targets are not part of this: they are re-read from the
/// `server_settings` table on every tick.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Directory holding the numbered schema files
    pub schema_dir: String,

    /// Local cache root; one subdirectory per target
    pub logs_dir: PathBuf,

    /// Seconds between scheduler ticks
    pub poll_interval_secs: u64,

    pub primary_ftp_timeout_secs: u64,
    pub sftp_timeout_secs: u64,
    pub safe_ftp_connect_timeout_secs: u64,

    /// How long primary FTP is avoided after a passive-mode mismatch
    pub ftp_backoff_secs: u64,

    /// Enables the ban lookup on login when set
    pub steam_api_key: Option<String>,

    /// Master enable flag
    pub enabled: bool,
}

impl IngestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SCUMFLOW_DB_PATH` (default: scumflow.db)
    /// - `SCUMFLOW_SCHEMA_DIR` (default: sql)
    /// - `SCUMFLOW_LOGS_DIR` (default: Logs)
    /// - `POLL_INTERVAL_SECS` (default: 20)
    /// - `PRIMARY_FTP_TIMEOUT_SECS` (default: 60)
    /// - `SFTP_TIMEOUT_SECS` (default: 90)
    /// - `SAFE_FTP_CONNECT_TIMEOUT_SECS` (default: 20)
    /// - `FTP_BACKOFF_SECS` (default: 86400)
    /// - `STEAM_WEB_API_KEY` (optional)
    /// - `ENABLE_INGEST` (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            db_path: lookup("SCUMFLOW_DB_PATH").unwrap_or_else(|| "scumflow.db".to_string()),

            schema_dir: lookup("SCUMFLOW_SCHEMA_DIR").unwrap_or_else(|| "sql".to_string()),

            logs_dir: PathBuf::from(
                lookup("SCUMFLOW_LOGS_DIR").unwrap_or_else(|| "Logs".to_string()),
            ),

            poll_interval_secs: number("POLL_INTERVAL_SECS", 20),
            primary_ftp_timeout_secs: number("PRIMARY_FTP_TIMEOUT_SECS", 60),
            sftp_timeout_secs: number("SFTP_TIMEOUT_SECS", 90),
            safe_ftp_connect_timeout_secs: number("SAFE_FTP_CONNECT_TIMEOUT_SECS", 20),
            ftp_backoff_secs: number("FTP_BACKOFF_SECS", 24 * 60 * 60),

            steam_api_key: lookup("STEAM_WEB_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),

            enabled: lookup("ENABLE_INGEST")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::Empty("SCUMFLOW_DB_PATH"));
        }
        if self.logs_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty("SCUMFLOW_LOGS_DIR"));
        }
        for (name, value) in [
            ("POLL_INTERVAL_SECS", self.poll_interval_secs),
            ("PRIMARY_FTP_TIMEOUT_SECS", self.primary_ftp_timeout_secs),
            ("SFTP_TIMEOUT_SECS", self.sftp_timeout_secs),
            ("SAFE_FTP_CONNECT_TIMEOUT_SECS", self.safe_ftp_connect_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { name });
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn primary_ftp_timeout(&self) -> Duration {
        Duration::from_secs(self.primary_ftp_timeout_secs)
    }

    pub fn sftp_timeout(&self) -> Duration {
        Duration::from_secs(self.sftp_timeout_secs)
    }

    pub fn safe_ftp_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.safe_ftp_connect_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
