//! Durable per-(target, log type) parse cursor

use sha2::{Digest, Sha256};

/// Message recorded when lines were consumed but none produced an event
pub const ADVANCED_NO_MATCH: &str = "advanced_no_match";

/// Longest `last_message` kept in the store
pub const MAX_MESSAGE_LEN: usize = 512;

/// Row of the `parsed_logs` table
///
/// `last_line` is the index of the last line consumed from `last_file`,
/// `-1` meaning nothing has been consumed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub last_file: Option<String>,
    pub last_line: i64,
    pub last_timestamp: Option<String>,
    pub last_file_size: Option<u64>,
    pub last_checksum: Option<String>,
    pub last_message: Option<String>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            last_file: None,
            last_line: -1,
            last_timestamp: None,
            last_file_size: None,
            last_checksum: None,
            last_message: None,
        }
    }
}

impl Checkpoint {
    /// Index of the last consumed line of `file_name`, or -1 to force a full reparse
    ///
    /// A different file name means the remote log rotated; a smaller size
    /// than recorded means it was truncated. Both restart from line 0.
    pub fn resume_index(&self, file_name: &str, file_size: u64) -> i64 {
        if self.last_file.as_deref() != Some(file_name) {
            return -1;
        }
        match self.last_file_size {
            Some(last_size) if file_size < last_size => -1,
            _ => self.last_line,
        }
    }
}

/// Hex SHA-256 of a checkpoint message
pub fn message_checksum(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

/// Clip a message to `MAX_MESSAGE_LEN` characters
pub fn clip_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(file: &str, line: i64, size: u64) -> Checkpoint {
        Checkpoint {
            last_file: Some(file.to_string()),
            last_line: line,
            last_file_size: Some(size),
            ..Checkpoint::default()
        }
    }

    #[test]
    fn test_no_prior_checkpoint_starts_from_beginning() {
        assert_eq!(Checkpoint::default().resume_index("kill_1.log", 100), -1);
    }

    #[test]
    fn test_same_file_resumes() {
        let cp = checkpoint("kill_1.log", 9, 1000);
        assert_eq!(cp.resume_index("kill_1.log", 1000), 9);
        assert_eq!(cp.resume_index("kill_1.log", 4000), 9);
    }

    #[test]
    fn test_rotation_and_truncation_reset() {
        let cp = checkpoint("kill_1.log", 9, 1000);
        assert_eq!(cp.resume_index("kill_2.log", 4000), -1, "rotated file");
        assert_eq!(cp.resume_index("kill_1.log", 999), -1, "truncated file");
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = message_checksum("advanced_no_match");
        assert_eq!(a.len(), 64);
        assert_eq!(a, message_checksum("advanced_no_match"));
        assert_ne!(a, message_checksum("other"));
    }

    #[test]
    fn test_clip_message_counts_chars() {
        let long = "é".repeat(MAX_MESSAGE_LEN + 10);
        assert_eq!(clip_message(&long).chars().count(), MAX_MESSAGE_LEN);
    }
}
