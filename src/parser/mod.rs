//! Checkpointed log parsers
//!
//! Every parser follows the same contract:
//! - the cached file is decoded as UTF-16LE, undecodable units are dropped
//! - only lines after the checkpoint's `last_line` are considered, unless the
//!   file rotated or shrank (see [`Checkpoint::resume_index`])
//! - lines shorter than 30 characters are skipped (partial writes)
//! - the returned checkpoint advances by the number of lines *scanned*, not
//!   the number of events emitted, so noise lines are never revisited
//!
//! Parsing is pure: the caller reads the previous checkpoint and commits the
//! returned batch (events + new checkpoint) in one store transaction.

pub mod admin;
pub mod chat;
pub mod kill;
pub mod login;
pub mod sentry;

use crate::model::checkpoint::{clip_message, message_checksum, ADVANCED_NO_MATCH};
use crate::model::events::format_ts;
use crate::model::{Checkpoint, DomainEvent, LogType};
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;

/// Lines shorter than this are treated as partial writes
pub const MIN_LINE_CHARS: usize = 30;

/// Timestamp format used inside the game's log lines
pub const LOG_TS_FORMAT: &str = "%Y.%m.%d-%H.%M.%S";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cache path: {0}")]
    InvalidPath(String),
}

/// Result of one parse pass over the unseen tail of a file
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub log_type: LogType,
    pub file_name: String,
    pub events: Vec<DomainEvent>,
    /// Lines consumed past the previous checkpoint (matched or not)
    pub scanned: usize,
    /// Checkpoint to commit together with `events`
    pub checkpoint: Checkpoint,
}

/// Parse the unseen lines of a cached log file
///
/// Returns `Ok(None)` when there is nothing past the checkpoint; in that case
/// the checkpoint must be left untouched.
pub fn parse_file(
    path: &Path,
    log_type: LogType,
    target_id: i64,
    previous: Option<&Checkpoint>,
) -> Result<Option<ParsedBatch>, ParseError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ParseError::InvalidPath(path.display().to_string()))?
        .to_string();

    let bytes = fs::read(path)?;
    let file_size = bytes.len() as u64;

    let resume = previous
        .map(|cp| cp.resume_index(&file_name, file_size))
        .unwrap_or(-1)
        .max(-1);

    let text = decode_utf16le(&bytes);
    let lines: Vec<&str> = text.lines().collect();

    let start = (resume + 1) as usize;
    if start >= lines.len() {
        return Ok(None);
    }

    let new_lines = &lines[start..];
    let candidates: Vec<&str> = new_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .collect();

    let events = match log_type {
        LogType::Chat => chat::parse_lines(&candidates, target_id),
        LogType::Login => login::parse_lines(&candidates, target_id),
        LogType::Kill => kill::parse_lines(&candidates, target_id),
        LogType::Admin => admin::parse_lines(&candidates, target_id),
        LogType::Sentry => sentry::parse_lines(&candidates, target_id),
    };

    let last_line = resume + new_lines.len() as i64;
    let checkpoint = next_checkpoint(&file_name, last_line, file_size, events.last());

    Ok(Some(ParsedBatch {
        log_type,
        file_name,
        events,
        scanned: new_lines.len(),
        checkpoint,
    }))
}

fn next_checkpoint(
    file_name: &str,
    last_line: i64,
    file_size: u64,
    last_event: Option<&DomainEvent>,
) -> Checkpoint {
    let (last_timestamp, message) = match last_event {
        Some(event) => (
            Some(format_ts(&event.timestamp())),
            clip_message(&event.checkpoint_message()),
        ),
        None => (None, ADVANCED_NO_MATCH.to_string()),
    };

    Checkpoint {
        last_file: Some(file_name.to_string()),
        last_line,
        last_timestamp,
        last_file_size: Some(file_size),
        last_checksum: Some(message_checksum(&message)),
        last_message: Some(message),
    }
}

/// Decode UTF-16LE bytes, dropping unpaired surrogates, a trailing odd byte
/// and a leading byte-order mark
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    let mut text: String = char::decode_utf16(units).filter_map(Result::ok).collect();
    if text.starts_with('\u{feff}') {
        text.remove(0);
    }
    text
}

/// Parse a `YYYY.MM.DD-HH.MM.SS` stamp, falling back to the current UTC time
pub(crate) fn parse_log_ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, LOG_TS_FORMAT)
        .unwrap_or_else(|_| chrono::Utc::now().naive_utc())
}
