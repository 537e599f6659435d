//! `server_settings` access

use super::{SqliteStore, StoreError};
use crate::model::RemoteTarget;

const DEFAULT_FTP_PORT: u16 = 21;

/// Source of the configured remote targets, re-read every tick
pub trait TargetSource: Send + Sync {
    /// Targets with host, user and remote directory configured
    fn load_targets(&self) -> Result<Vec<RemoteTarget>, StoreError>;

    /// `(total rows, rows with transfer settings)`
    fn server_counts(&self) -> Result<(u64, u64), StoreError>;
}

impl TargetSource for SqliteStore {
    fn load_targets(&self) -> Result<Vec<RemoteTarget>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT target_id, server_name, ftp_host, ftp_port, ftp_user, ftp_pass, ftp_dir, post_sentries
             FROM server_settings
             WHERE ftp_host IS NOT NULL AND ftp_user IS NOT NULL AND ftp_dir IS NOT NULL
             ORDER BY target_id",
        )?;

        let rows = stmt.query_map([], |row| {
            let port: Option<i64> = row.get(3)?;
            let host: String = row.get(2)?;
            Ok(RemoteTarget {
                target_id: row.get(0)?,
                server_name: row.get(1)?,
                host: host.trim().to_string(),
                port: port
                    .and_then(|p| u16::try_from(p).ok())
                    .filter(|p| *p != 0)
                    .unwrap_or(DEFAULT_FTP_PORT),
                username: row.get(4)?,
                password: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                remote_dir: row.get(6)?,
                sentry_stats: row.get::<_, Option<i64>>(7)?.unwrap_or(0) == 1,
            })
        })?;

        let targets = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(targets)
    }

    fn server_counts(&self) -> Result<(u64, u64), StoreError> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM server_settings", [], |row| {
            row.get(0)
        })?;
        let configured: i64 = conn.query_row(
            "SELECT COUNT(*) FROM server_settings
             WHERE ftp_host IS NOT NULL AND ftp_user IS NOT NULL AND ftp_dir IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok((total as u64, configured as u64))
    }
}
