//! Fixed-interval scheduler fanning out one task per configured target

use super::target_task::TargetHandle;
use super::IngestContext;
use crate::transport::TransportSelector;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};

/// Summary of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub targets: usize,
    pub succeeded: usize,
    pub elapsed_ms: u128,
}

pub struct Scheduler {
    ctx: Arc<IngestContext>,
    // Reused across ticks so preference and backoff survive
    handles: HashMap<i64, Arc<Mutex<TargetHandle>>>,
    tick: u64,
}

impl Scheduler {
    pub fn new(ctx: Arc<IngestContext>) -> Self {
        Self {
            ctx,
            handles: HashMap::new(),
            tick: 0,
        }
    }

    /// Handle for a target, if it has been scheduled at least once
    pub fn handle(&self, target_id: i64) -> Option<Arc<Mutex<TargetHandle>>> {
        self.handles.get(&target_id).cloned()
    }

    /// Tick until `shutdown` flips to `true`
    ///
    /// A tick in progress always completes: shutdown is only observed between
    /// ticks by the loop, and between files by each target's scan.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let poll = self.ctx.config.poll_interval();
        log::info!(
            "⏰ Starting ingest scheduler (poll: {}s; logs: chat, login, kill, admin, sentry)",
            poll.as_secs()
        );
        log::info!("   └─ Steam ban lookups: {}", self.ctx.bans.is_some());

        let mut timer = interval(poll);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let sender_gone = tokio::select! {
                _ = timer.tick() => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if sender_gone || *shutdown.borrow() {
                break;
            }
            self.run_tick(&shutdown).await;
        }

        log::info!("🛑 Ingest scheduler stopped after {} ticks", self.tick);
    }

    /// Run every configured target once and wait for all of them
    pub async fn run_tick(&mut self, stop: &watch::Receiver<bool>) -> TickReport {
        self.tick += 1;
        let tick = self.tick;
        let verbose = tick % 5 == 0;
        let started = Instant::now();

        let targets = match self.ctx.targets.load_targets() {
            Ok(targets) => targets,
            Err(e) => {
                log::error!("❌ Failed to load targets, skipping tick {}: {}", tick, e);
                return TickReport {
                    tick,
                    ..TickReport::default()
                };
            }
        };
        let (total, configured) = self.ctx.targets.server_counts().unwrap_or((0, 0));

        if targets.is_empty() {
            if verbose {
                log::info!("💤 No servers configured ({}/{})", configured, total);
            } else {
                log::debug!("No servers configured ({}/{})", configured, total);
            }
            return TickReport {
                tick,
                ..TickReport::default()
            };
        }

        if verbose {
            log::info!("🔎 Scan start (configured={}/{})", targets.len(), total);
        } else {
            log::debug!("Scan start (configured={})", targets.len());
        }

        self.handles
            .retain(|id, _| targets.iter().any(|t| t.target_id == *id));

        let backoff = chrono::Duration::seconds(self.ctx.config.ftp_backoff_secs as i64);
        let mut tasks = JoinSet::new();
        for target in targets.iter().cloned() {
            let handle = self
                .handles
                .entry(target.target_id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(TargetHandle::new(TransportSelector::new(backoff))))
                })
                .clone();
            let ctx = Arc::clone(&self.ctx);
            let stop = stop.clone();

            tasks.spawn(async move {
                let mut handle = handle.lock().await;
                handle.run_pass(&ctx, &target, tick, &stop).await.is_some()
            });
        }

        let mut succeeded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(e) => log::error!("❌ Target task panicked: {}", e),
            }
        }

        let report = TickReport {
            tick,
            targets: targets.len(),
            succeeded,
            elapsed_ms: started.elapsed().as_millis(),
        };
        if verbose {
            log::info!(
                "✅ Scan complete ({}/{} ok, {}ms). Next scan in {}s",
                report.succeeded,
                report.targets,
                report.elapsed_ms,
                self.ctx.config.poll_interval_secs
            );
        } else {
            log::debug!("Scan complete ({}ms)", report.elapsed_ms);
        }
        report
    }
}
