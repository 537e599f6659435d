//! One target's pass: pick a transport, scan, fall back to safe FTP on failure

use super::scanner::{scan_remote, ScanStats};
use super::throttle::WarnThrottle;
use super::IngestContext;
use crate::model::{RemoteTarget, TransportKind};
use crate::transport::{TransportError, TransportSelector};
use chrono::Utc;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Outcome of a successful pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub transport: TransportKind,
    pub stats: ScanStats,
    pub elapsed_ms: u128,
}

/// Per-target state kept across ticks
///
/// Owns the transport preference and backoff for one target, plus its
/// warning throttle. Only that target's task ever touches it.
#[derive(Debug, Default)]
pub struct TargetHandle {
    selector: TransportSelector,
    throttle: WarnThrottle,
}

impl TargetHandle {
    pub fn new(selector: TransportSelector) -> Self {
        Self {
            selector,
            throttle: WarnThrottle::default(),
        }
    }

    pub fn selector(&self) -> &TransportSelector {
        &self.selector
    }

    /// Run one scan pass; never returns an error to the scheduler
    ///
    /// `None` means the pass failed on every transport tried (already logged).
    pub async fn run_pass(
        &mut self,
        ctx: &IngestContext,
        target: &RemoteTarget,
        tick: u64,
        stop: &watch::Receiver<bool>,
    ) -> Option<PassReport> {
        let label = target.label();
        let started = Instant::now();

        let cache_dir = ctx.config.logs_dir.join(target.target_id.to_string());
        if let Err(e) = tokio::fs::create_dir_all(&cache_dir).await {
            log::error!("❌ [{}] Cannot create cache dir {}: {}", label, cache_dir.display(), e);
            return None;
        }

        let first = self.selector.choose(target, Utc::now());
        let limit = match first {
            TransportKind::PrimaryFtp => Some(ctx.config.primary_ftp_timeout()),
            TransportKind::Sftp => Some(ctx.config.sftp_timeout()),
            TransportKind::SafeFtp => None,
        };

        let mut outcome = attempt(ctx, target, first, &cache_dir, limit, stop).await;
        let mut used = first;

        if let Err(e) = &outcome {
            if first != TransportKind::SafeFtp {
                let opened_backoff = self.selector.record_failure(first, e, Utc::now());
                if opened_backoff {
                    self.throttle.warn(
                        "passive_mode_mismatch",
                        &label,
                        &format!(
                            "{} incompatible (EPSV/PASV mismatch). Falling back to safe FTP for {}h.",
                            first,
                            ctx.config.ftp_backoff_secs / 3600
                        ),
                    );
                } else {
                    self.throttle.warn(
                        failure_key(first),
                        &label,
                        &format!("{} failed; falling back to safe FTP ({})", first, e),
                    );
                }

                used = TransportKind::SafeFtp;
                outcome = attempt(ctx, target, used, &cache_dir, None, stop).await;
            }
        }

        match outcome {
            Ok(stats) => {
                if used == first {
                    self.selector.record_success(used);
                } else if first == TransportKind::PrimaryFtp {
                    self.selector.record_success(TransportKind::SafeFtp);
                }
                let report = PassReport {
                    transport: used,
                    stats,
                    elapsed_ms: started.elapsed().as_millis(),
                };
                let line = format!(
                    "[{}] scan ok | transport={} | {} | {}ms",
                    label, report.transport, report.stats, report.elapsed_ms
                );
                if tick % 5 == 0 {
                    log::info!("📥 {}", line);
                } else {
                    log::debug!("{}", line);
                }
                Some(report)
            }
            Err(e) => {
                self.throttle.warn(
                    failure_key(used),
                    &label,
                    &format!(
                        "scan failed (transport={}, host={}, port={}): {}",
                        used, target.host, target.port, e
                    ),
                );
                None
            }
        }
    }
}

fn failure_key(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::PrimaryFtp => "primary_ftp_failed",
        TransportKind::SafeFtp => "safe_ftp_failed",
        TransportKind::Sftp => "sftp_failed",
    }
}

/// Connect, scan and close over one transport, optionally time-bounded
async fn attempt(
    ctx: &IngestContext,
    target: &RemoteTarget,
    kind: TransportKind,
    cache_dir: &Path,
    limit: Option<Duration>,
    stop: &watch::Receiver<bool>,
) -> Result<ScanStats, TransportError> {
    let run = async {
        let mut fs = ctx.connector.connect(kind, target).await?;
        let result = scan_remote(fs.as_mut(), ctx, target, cache_dir, stop).await;
        fs.close().await;
        result
    };

    match limit {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                kind,
                secs: limit.as_secs(),
            }),
        },
        None => run.await,
    }
}
