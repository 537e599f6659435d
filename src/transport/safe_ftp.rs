//! Blocking FTP client run on the blocking pool
//!
//! Slower than the async client but tolerant of servers that only speak PASV
//! or disable MLSD/NLST.

use super::listing::{list_file_name, mlsd_file_name, nlst_file_name};
use super::{resolve, RemoteFs, TransportError};
use crate::model::{RemoteTarget, TransportKind};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};

pub struct SafeFtp {
    stream: Arc<Mutex<FtpStream>>,
}

impl SafeFtp {
    pub async fn connect(target: &RemoteTarget, timeout: Duration) -> Result<Self, TransportError> {
        let target = target.clone();
        let stream = tokio::task::spawn_blocking(move || -> Result<FtpStream, TransportError> {
            let addr = resolve(&target.host, target.port)?;
            let mut stream = FtpStream::connect_timeout(addr, timeout)?;
            stream.get_ref().set_read_timeout(Some(timeout))?;
            stream.login(target.username.as_str(), target.password.as_str())?;
            stream.cwd(target.remote_dir.as_str())?;
            stream.transfer_type(FileType::Binary)?;
            stream.set_mode(Mode::Passive);
            Ok(stream)
        })
        .await??;

        Ok(Self {
            stream: Arc::new(Mutex::new(stream)),
        })
    }

    async fn with_stream<T, F>(&self, op: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T, TransportError> + Send + 'static,
    {
        let stream = Arc::clone(&self.stream);
        tokio::task::spawn_blocking(move || {
            let mut guard = stream
                .lock()
                .map_err(|_| TransportError::Protocol("FTP session lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await?
    }
}

/// MLSD, then NLST, then LIST parsed for the name column
fn list_with_fallback(stream: &mut FtpStream) -> Result<Vec<String>, TransportError> {
    match stream.mlsd(None) {
        Ok(lines) => {
            let names: Vec<String> = lines
                .iter()
                .filter_map(|line| mlsd_file_name(line))
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                return Ok(names);
            }
        }
        Err(e) => log::debug!("MLSD unavailable, trying NLST: {}", e),
    }

    match stream.nlst(None) {
        Ok(entries) => {
            return Ok(entries
                .iter()
                .filter_map(|entry| nlst_file_name(entry))
                .map(str::to_string)
                .collect())
        }
        Err(e) => log::debug!("NLST unavailable, trying LIST: {}", e),
    }

    let lines = stream.list(None)?;
    Ok(lines
        .iter()
        .filter_map(|line| list_file_name(line))
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl RemoteFs for SafeFtp {
    fn kind(&self) -> TransportKind {
        TransportKind::SafeFtp
    }

    async fn list_files(&mut self) -> Result<Vec<String>, TransportError> {
        self.with_stream(list_with_fallback).await
    }

    async fn stat_file(&mut self, name: &str) -> Result<u64, TransportError> {
        let name = name.to_string();
        self.with_stream(move |stream| Ok(stream.size(name.as_str())? as u64))
            .await
    }

    async fn fetch_file(&mut self, name: &str, dest: &Path) -> Result<u64, TransportError> {
        let name = name.to_string();
        let dest: PathBuf = dest.to_path_buf();
        self.with_stream(move |stream| {
            let buf = stream.retr_as_buffer(name.as_str())?.into_inner();
            std::fs::write(&dest, &buf)?;
            Ok(buf.len() as u64)
        })
        .await
    }

    async fn close(&mut self) {
        let result = self
            .with_stream(|stream| stream.quit().map_err(TransportError::from))
            .await;
        if let Err(e) = result {
            log::debug!("safe FTP quit failed: {}", e);
        }
    }
}
