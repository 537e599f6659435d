//! Remote scan: list, size-compare, fetch changed files, ingest each one

use super::{IngestContext, PipelineError};
use crate::model::{DomainEvent, LogType, LoginState, RemoteTarget};
use crate::parser::parse_file;
use crate::transport::{RemoteFs, TransportError};
use std::fmt;
use std::path::Path;
use tokio::sync::watch;

/// Files fetched and events ingested during one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files: usize,
    pub chat: usize,
    pub login: usize,
    pub kill: usize,
    pub admin: usize,
    pub sentry: usize,
}

impl ScanStats {
    pub fn add_events(&mut self, log_type: LogType, count: usize) {
        let slot = match log_type {
            LogType::Chat => &mut self.chat,
            LogType::Login => &mut self.login,
            LogType::Kill => &mut self.kill,
            LogType::Admin => &mut self.admin,
            LogType::Sentry => &mut self.sentry,
        };
        *slot += count;
    }

    pub fn events(&self) -> usize {
        self.chat + self.login + self.kill + self.admin + self.sentry
    }
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files={} | new: chat={} login={} kill={} admin={} sentry={}",
            self.files, self.chat, self.login, self.kill, self.admin, self.sentry
        )
    }
}

/// Plain file names only; anything path-like stays on the server
fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// Recognised log files, oldest first within each log type
///
/// The checkpoint for a log type follows the last file ingested, so an older
/// rotated file must never be ingested after the current one. Names carry a
/// `YYYYMMDDHHMMSS` stamp, which sorts chronologically as text.
fn ordered_log_files(names: Vec<String>, label: &str) -> Vec<(String, LogType)> {
    let mut files: Vec<(String, LogType)> = names
        .into_iter()
        .filter_map(|name| {
            let log_type = LogType::from_file_name(&name)?;
            if !is_safe_name(&name) {
                log::debug!("[{}] Skipping suspicious remote name {:?}", label, name);
                return None;
            }
            Some((name, log_type))
        })
        .collect();
    files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    files.dedup_by(|a, b| a.0 == b.0);
    files
}

/// Walk the remote directory once and ingest every new or changed log file
///
/// Transport errors abort the scan and are returned for fallback handling.
/// Parse and store errors only affect the file they occurred on: the cached
/// copy is removed so the next pass fetches and retries it.
pub async fn scan_remote(
    fs: &mut dyn RemoteFs,
    ctx: &IngestContext,
    target: &RemoteTarget,
    cache_dir: &Path,
    stop: &watch::Receiver<bool>,
) -> Result<ScanStats, TransportError> {
    let mut stats = ScanStats::default();
    let names = fs.list_files().await?;

    for (name, log_type) in ordered_log_files(names, &target.label()) {
        if *stop.borrow() {
            log::debug!("[{}] Shutdown requested, stopping scan", target.label());
            break;
        }

        let local_path = cache_dir.join(&name);
        let remote_size = fs.stat_file(&name).await?;
        if let Ok(meta) = tokio::fs::metadata(&local_path).await {
            if meta.len() == remote_size {
                continue;
            }
        }

        fs.fetch_file(&name, &local_path).await?;
        stats.files += 1;

        match ingest_file(ctx, target, &local_path, log_type).await {
            Ok(count) => stats.add_events(log_type, count),
            Err(e) => {
                log::error!(
                    "❌ [{}] {} ingest failed for {}: {}",
                    target.label(),
                    log_type,
                    name,
                    e
                );
                if let Err(rm) = tokio::fs::remove_file(&local_path).await {
                    log::debug!("[{}] Could not drop cached {}: {}", target.label(), name, rm);
                }
            }
        }
    }

    Ok(stats)
}

/// Parse the unseen tail of one cached file and commit it with its checkpoint
///
/// Returns the number of events committed.
pub async fn ingest_file(
    ctx: &IngestContext,
    target: &RemoteTarget,
    path: &Path,
    log_type: LogType,
) -> Result<usize, PipelineError> {
    let previous = ctx.checkpoints.get_checkpoint(target.target_id, log_type)?;

    let owned_path = path.to_path_buf();
    let target_id = target.target_id;
    let parsed = tokio::task::spawn_blocking(move || {
        parse_file(&owned_path, log_type, target_id, previous.as_ref())
    })
    .await?;
    let Some(batch) = parsed? else {
        return Ok(0);
    };

    let summary = ctx.sink.commit_batch(target, &batch).await?;
    log::debug!(
        "[{}] {}: {} lines scanned, {} stored, {} duplicates",
        target.label(),
        batch.file_name,
        batch.scanned,
        summary.facts,
        summary.duplicates
    );

    if let Some(bans) = &ctx.bans {
        for event in &batch.events {
            if let DomainEvent::Login(login) = event {
                if login.state == LoginState::In && !login.actor.steam_id.is_empty() {
                    bans.spawn_scan(
                        target.target_id,
                        login.actor.steam_id.clone(),
                        login.actor.username.clone(),
                    );
                }
            }
        }
    }

    Ok(batch.events.len())
}
