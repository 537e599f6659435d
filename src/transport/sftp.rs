//! SSH file transfer via libssh2 on the blocking pool

use super::{resolve, RemoteFs, TransportError};
use crate::model::{RemoteTarget, TransportKind};
use async_trait::async_trait;
use ssh2::{Session, Sftp};
use std::io;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct SftpSession {
    // Keeps the SSH session alive for as long as the SFTP channel
    session: Session,
    sftp: Sftp,
    remote_dir: PathBuf,
}

pub struct SftpFs {
    inner: Arc<Mutex<SftpSession>>,
}

impl SftpFs {
    pub async fn connect(target: &RemoteTarget, timeout: Duration) -> Result<Self, TransportError> {
        let target = target.clone();
        let inner = tokio::task::spawn_blocking(move || -> Result<SftpSession, TransportError> {
            let addr = resolve(&target.host, target.port)?;
            let tcp = TcpStream::connect_timeout(&addr, timeout)?;

            let mut session = Session::new()?;
            session.set_tcp_stream(tcp);
            session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
            session.handshake()?;
            session.userauth_password(&target.username, &target.password)?;
            if !session.authenticated() {
                return Err(TransportError::Protocol("SSH authentication rejected".to_string()));
            }

            let sftp = session.sftp()?;
            let remote_dir = PathBuf::from(&target.remote_dir);
            // Fails early when the directory does not exist
            sftp.stat(&remote_dir)?;

            Ok(SftpSession {
                session,
                sftp,
                remote_dir,
            })
        })
        .await??;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    async fn with_session<T, F>(&self, op: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&SftpSession) -> Result<T, TransportError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let guard = inner
                .lock()
                .map_err(|_| TransportError::Protocol("SFTP session lock poisoned".to_string()))?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl RemoteFs for SftpFs {
    fn kind(&self) -> TransportKind {
        TransportKind::Sftp
    }

    async fn list_files(&mut self) -> Result<Vec<String>, TransportError> {
        self.with_session(|s| {
            let entries = s.sftp.readdir(&s.remote_dir)?;
            Ok(entries
                .into_iter()
                .filter(|(_, stat)| !stat.is_dir())
                .filter_map(|(path, _)| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .map(str::to_string)
                })
                .collect())
        })
        .await
    }

    async fn stat_file(&mut self, name: &str) -> Result<u64, TransportError> {
        let name = name.to_string();
        self.with_session(move |s| {
            let stat = s.sftp.stat(&s.remote_dir.join(&name))?;
            stat.size
                .ok_or_else(|| TransportError::Protocol(format!("No size reported for {}", name)))
        })
        .await
    }

    async fn fetch_file(&mut self, name: &str, dest: &Path) -> Result<u64, TransportError> {
        let name = name.to_string();
        let dest = dest.to_path_buf();
        self.with_session(move |s| {
            let mut remote = s.sftp.open(&s.remote_dir.join(&name))?;
            let mut local = std::fs::File::create(&dest)?;
            let written = io::copy(&mut remote, &mut local)?;
            Ok(written)
        })
        .await
    }

    async fn close(&mut self) {
        let result = self
            .with_session(|s| {
                s.session.disconnect(None, "bye", None)?;
                Ok(())
            })
            .await;
        if let Err(e) = result {
            log::debug!("SFTP disconnect failed: {}", e);
        }
    }
}
