//! Idempotent schema loader
//!
//! Reads every `.sql` file of a directory in name order (`00_`, `01_`, …)
//! and executes it. All statements use `IF NOT EXISTS`, so running the loader
//! on every start is safe.

use super::StoreError;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub fn run_schema_migrations(conn: &mut Connection, schema_dir: &str) -> Result<(), StoreError> {
    let schema_path = Path::new(schema_dir);

    if !schema_path.exists() {
        return Err(StoreError::Schema(format!(
            "Schema directory not found: {}",
            schema_dir
        )));
    }

    // PRAGMA journal_mode returns a row, pragma_update handles that
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    log::debug!("📊 Enabled WAL mode for SQLite database");

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort_by_key(|entry| entry.file_name());

    log::info!("🔧 Running schema migrations from: {}", schema_dir);

    for entry in sql_files {
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();

        let sql_content = fs::read_to_string(&path)?;
        conn.execute_batch(&sql_content)
            .map_err(|e| StoreError::Schema(format!("{}: {}", filename, e)))?;

        log::debug!("   ├─ ✅ Applied: {}", filename);
    }

    log::info!("✅ All schema migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_migrations_are_idempotent() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut conn = Connection::open(temp_file.path()).unwrap();

        run_schema_migrations(&mut conn, "sql").unwrap();
        run_schema_migrations(&mut conn, "sql").unwrap();

        for table in [
            "server_settings",
            "parsed_logs",
            "chat_logs",
            "login_logs",
            "kill_logs",
            "admin_logs",
            "sentry_logs",
            "player_statistics",
            "weapon_stats",
            "pending_links",
            "steam_ban_events",
        ] {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {}", table);
        }
    }

    #[test]
    fn test_missing_schema_dir_is_an_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = run_schema_migrations(&mut conn, "does/not/exist").unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
    }
}
