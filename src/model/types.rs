//! Target and log-type definitions shared by every pipeline stage

use std::fmt;

/// One configured remote game server
///
/// Rows come from the `server_settings` table and are re-read every tick.
/// The pipeline never mutates them.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTarget {
    pub target_id: i64,
    pub server_name: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub remote_dir: String,
    /// Whether destroyed sentries count toward the attacker's `sentry_kills`
    pub sentry_stats: bool,
}

impl RemoteTarget {
    /// Consistent label for log lines: `"<name> (<id>)"` or just the id
    pub fn label(&self) -> String {
        match self.server_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} ({})", name, self.target_id),
            _ => self.target_id.to_string(),
        }
    }
}

/// The five remote log families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogType {
    Chat,
    Login,
    Kill,
    Admin,
    Sentry,
}

impl LogType {
    pub const ALL: [LogType; 5] = [
        LogType::Chat,
        LogType::Login,
        LogType::Kill,
        LogType::Admin,
        LogType::Sentry,
    ];

    /// Key used in the `parsed_logs` checkpoint table
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Chat => "chat",
            LogType::Login => "login",
            LogType::Kill => "kill",
            LogType::Admin => "admin",
            LogType::Sentry => "sentry",
        }
    }

    /// Classify a remote file name by naming convention
    ///
    /// Prefixes are case-sensitive; sentry files match on a case-insensitive
    /// substring. Anything else is not a log file we ingest.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.starts_with("chat_") {
            Some(LogType::Chat)
        } else if name.starts_with("login_") {
            Some(LogType::Login)
        } else if name.starts_with("kill_") {
            Some(LogType::Kill)
        } else if name.starts_with("admin_") {
            Some(LogType::Admin)
        } else if name.to_ascii_lowercase().contains("sentry") {
            Some(LogType::Sentry)
        } else {
            None
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-transfer mechanisms a target can be reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Sftp,
    PrimaryFtp,
    SafeFtp,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Sftp => "sftp",
            TransportKind::PrimaryFtp => "primary_ftp",
            TransportKind::SafeFtp => "safe_ftp",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
