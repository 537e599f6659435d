//! Remote file access over three interchangeable mechanisms
//!
//! - `primary_ftp` - async FTP client, EPSV data channel, MLSD listing
//! - `safe_ftp` - blocking FTP client, PASV data channel, MLSD/NLST/LIST fallback
//! - `sftp` - SSH file transfer
//!
//! All three expose the same [`RemoteFs`] capability; the scanner never knows
//! which one it is talking to. [`TransportSelector`] decides which to use.

pub mod listing;
pub mod primary_ftp;
pub mod safe_ftp;
pub mod selector;
pub mod sftp;

pub use selector::TransportSelector;

use crate::model::{RemoteTarget, TransportKind};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} timed out after {secs}s")]
    Timeout { kind: TransportKind, secs: u64 },

    #[error("Cannot resolve {0}")]
    Resolve(String),

    #[error("Blocking transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Server answered PASV (227) where EPSV (229) was requested
    #[error("EPSV/PASV mismatch: {0}")]
    PassiveModeMismatch(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Known-incompatible passive mode negotiation
    pub fn is_passive_mode_mismatch(&self) -> bool {
        match self {
            TransportError::PassiveModeMismatch(_) => true,
            other => {
                let text = other.to_string();
                text.contains("229") && text.contains("227")
            }
        }
    }
}

/// Remote directory already entered and authenticated
#[async_trait]
pub trait RemoteFs: Send {
    fn kind(&self) -> TransportKind;

    /// File names in the remote log directory (directories excluded)
    async fn list_files(&mut self) -> Result<Vec<String>, TransportError>;

    /// Size of a remote file in bytes
    async fn stat_file(&mut self, name: &str) -> Result<u64, TransportError>;

    /// Download `name` to `dest`, replacing any existing file. Returns bytes written.
    async fn fetch_file(&mut self, name: &str, dest: &Path) -> Result<u64, TransportError>;

    /// Best-effort logout
    async fn close(&mut self);
}

/// Opens a [`RemoteFs`] for a target over the requested mechanism
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        kind: TransportKind,
        target: &RemoteTarget,
    ) -> Result<Box<dyn RemoteFs>, TransportError>;
}

/// Connector backed by real network clients
#[derive(Debug, Clone)]
pub struct NetworkConnector {
    /// Connect timeout for the blocking clients
    pub connect_timeout: Duration,
}

impl Default for NetworkConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(20),
        }
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn connect(
        &self,
        kind: TransportKind,
        target: &RemoteTarget,
    ) -> Result<Box<dyn RemoteFs>, TransportError> {
        let fs: Box<dyn RemoteFs> = match kind {
            TransportKind::PrimaryFtp => Box::new(primary_ftp::PrimaryFtp::connect(target).await?),
            TransportKind::SafeFtp => {
                Box::new(safe_ftp::SafeFtp::connect(target, self.connect_timeout).await?)
            }
            TransportKind::Sftp => Box::new(sftp::SftpFs::connect(target, self.connect_timeout).await?),
        };
        log::debug!("🔌 Connected to {} via {}", target.label(), kind);
        Ok(fs)
    }
}

/// Resolve `host:port` to the first socket address
pub(crate) fn resolve(host: &str, port: u16) -> Result<std::net::SocketAddr, TransportError> {
    use std::net::ToSocketAddrs;
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransportError::Resolve(format!("{}:{}", host, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_mode_mismatch_detection() {
        let err = TransportError::Protocol("Waiting for ('229',) but got 227".to_string());
        assert!(err.is_passive_mode_mismatch());

        let err = TransportError::PassiveModeMismatch("227 Entering Passive Mode".to_string());
        assert!(err.is_passive_mode_mismatch());

        let err = TransportError::Protocol("530 Login incorrect".to_string());
        assert!(!err.is_passive_mode_mismatch());

        let err = TransportError::Timeout {
            kind: TransportKind::PrimaryFtp,
            secs: 60,
        };
        assert!(!err.is_passive_mode_mismatch());
    }
}
