//! Async FTP client: EPSV data channel, single MLSD listing call

use super::listing::mlsd_file_name;
use super::{RemoteFs, TransportError};
use crate::model::{RemoteTarget, TransportKind};
use async_trait::async_trait;
use futures::AsyncReadExt;
use std::path::Path;
use suppaftp::types::FileType;
use suppaftp::{AsyncFtpStream, FtpError, Mode};

pub struct PrimaryFtp {
    stream: AsyncFtpStream,
}

impl PrimaryFtp {
    pub async fn connect(target: &RemoteTarget) -> Result<Self, TransportError> {
        let mut stream = AsyncFtpStream::connect((target.host.as_str(), target.port)).await?;
        stream
            .login(target.username.as_str(), target.password.as_str())
            .await?;
        stream.cwd(target.remote_dir.as_str()).await?;
        stream.transfer_type(FileType::Binary).await?;
        stream.set_mode(Mode::ExtendedPassive);
        Ok(Self { stream })
    }
}

/// Data-channel errors carrying a 227 reply mean the server ignored EPSV
fn data_channel_error(err: FtpError) -> TransportError {
    let text = err.to_string();
    if text.contains("227") {
        TransportError::PassiveModeMismatch(format!("Waiting for ('229',) but got 227: {}", text))
    } else {
        TransportError::Ftp(err)
    }
}

#[async_trait]
impl RemoteFs for PrimaryFtp {
    fn kind(&self) -> TransportKind {
        TransportKind::PrimaryFtp
    }

    async fn list_files(&mut self) -> Result<Vec<String>, TransportError> {
        let lines = self.stream.mlsd(None).await.map_err(data_channel_error)?;
        Ok(lines
            .iter()
            .filter_map(|line| mlsd_file_name(line))
            .map(str::to_string)
            .collect())
    }

    async fn stat_file(&mut self, name: &str) -> Result<u64, TransportError> {
        let size = self.stream.size(name).await?;
        Ok(size as u64)
    }

    async fn fetch_file(&mut self, name: &str, dest: &Path) -> Result<u64, TransportError> {
        let mut data_stream = self.stream.retr_as_stream(name).await.map_err(data_channel_error)?;
        let mut buf = Vec::new();
        data_stream.read_to_end(&mut buf).await?;
        self.stream.finalize_retr_stream(data_stream).await?;

        tokio::fs::write(dest, &buf).await?;
        Ok(buf.len() as u64)
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.quit().await {
            log::debug!("primary FTP quit failed: {}", e);
        }
    }
}
