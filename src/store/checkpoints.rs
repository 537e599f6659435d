//! `parsed_logs` access

use super::{SqliteStore, StoreError};
use crate::model::{Checkpoint, LogType};
use rusqlite::{params, Connection, OptionalExtension};

/// Durable parse cursor keyed by (target, log type)
pub trait CheckpointStore: Send + Sync {
    /// `Ok(None)` means no prior checkpoint: parse from the beginning
    fn get_checkpoint(
        &self,
        target_id: i64,
        log_type: LogType,
    ) -> Result<Option<Checkpoint>, StoreError>;

    /// Upsert the cursor
    fn set_checkpoint(
        &self,
        target_id: i64,
        log_type: LogType,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError>;
}

impl CheckpointStore for SqliteStore {
    fn get_checkpoint(
        &self,
        target_id: i64,
        log_type: LogType,
    ) -> Result<Option<Checkpoint>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT last_file, last_line, last_timestamp, last_file_size, last_checksum, last_message
                 FROM parsed_logs
                 WHERE target_id = ?1 AND log_type = ?2",
                params![target_id, log_type.as_str()],
                |row| {
                    Ok(Checkpoint {
                        last_file: row.get(0)?,
                        last_line: row.get::<_, Option<i64>>(1)?.unwrap_or(-1),
                        last_timestamp: row.get(2)?,
                        last_file_size: row
                            .get::<_, Option<i64>>(3)?
                            .and_then(|size| u64::try_from(size).ok()),
                        last_checksum: row.get(4)?,
                        last_message: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn set_checkpoint(
        &self,
        target_id: i64,
        log_type: LogType,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        upsert_checkpoint(&conn, target_id, log_type, checkpoint)
    }
}

/// Upsert used both standalone and inside a batch transaction
pub(crate) fn upsert_checkpoint(
    conn: &Connection,
    target_id: i64,
    log_type: LogType,
    checkpoint: &Checkpoint,
) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO parsed_logs (
            target_id, log_type,
            last_file, last_line, last_timestamp,
            last_file_size, last_checksum, last_parse, last_message
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), ?8)
        ON CONFLICT(target_id, log_type) DO UPDATE SET
            last_file = excluded.last_file,
            last_line = excluded.last_line,
            last_timestamp = excluded.last_timestamp,
            last_file_size = excluded.last_file_size,
            last_checksum = excluded.last_checksum,
            last_parse = excluded.last_parse,
            last_message = excluded.last_message
        "#,
        params![
            target_id,
            log_type.as_str(),
            checkpoint.last_file,
            checkpoint.last_line,
            checkpoint.last_timestamp,
            checkpoint.last_file_size.map(|size| size as i64),
            checkpoint.last_checksum.as_deref().unwrap_or(""),
            checkpoint.last_message.as_deref().unwrap_or(""),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_store() -> (NamedTempFile, SqliteStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteStore::open(temp_file.path(), "sql").unwrap();
        (temp_file, store)
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let (_temp, store) = test_store();
        assert_eq!(store.get_checkpoint(1, LogType::Kill).unwrap(), None);
    }

    #[test]
    fn test_set_then_get_round_trips_and_upserts() {
        let (_temp, store) = test_store();
        let mut cp = Checkpoint {
            last_file: Some("kill_1.log".to_string()),
            last_line: 12,
            last_timestamp: Some("2024-03-01 10:00:00".to_string()),
            last_file_size: Some(4096),
            last_checksum: Some("abc".to_string()),
            last_message: Some("1->2:AK".to_string()),
        };
        store.set_checkpoint(1, LogType::Kill, &cp).unwrap();
        assert_eq!(store.get_checkpoint(1, LogType::Kill).unwrap(), Some(cp.clone()));

        cp.last_line = 30;
        store.set_checkpoint(1, LogType::Kill, &cp).unwrap();
        assert_eq!(store.get_checkpoint(1, LogType::Kill).unwrap().unwrap().last_line, 30);

        // Other log types and targets are independent
        assert_eq!(store.get_checkpoint(1, LogType::Chat).unwrap(), None);
        assert_eq!(store.get_checkpoint(2, LogType::Kill).unwrap(), None);
    }
}
