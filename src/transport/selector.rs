//! Per-target transport choice with a time-bounded backoff
//!
//! State is process-local and rebuilt from the host/port heuristic on restart.

use super::TransportError;
use crate::model::{RemoteTarget, TransportKind};
use chrono::{DateTime, Duration, Utc};

/// Default backoff after a passive-mode mismatch
pub const DEFAULT_BACKOFF_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct TransportSelector {
    preference: Option<TransportKind>,
    backoff_until: Option<DateTime<Utc>>,
    backoff: Duration,
}

impl Default for TransportSelector {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_BACKOFF_SECS))
    }
}

impl TransportSelector {
    pub fn new(backoff: Duration) -> Self {
        Self {
            preference: None,
            backoff_until: None,
            backoff,
        }
    }

    /// Heuristic used until a transport has succeeded once
    pub fn heuristic(target: &RemoteTarget) -> TransportKind {
        if target.port == 22 || target.host.to_ascii_lowercase().contains("sftp") {
            TransportKind::Sftp
        } else {
            TransportKind::PrimaryFtp
        }
    }

    /// Transport to try first this tick
    pub fn choose(&self, target: &RemoteTarget, now: DateTime<Utc>) -> TransportKind {
        if self.in_backoff(now) {
            return TransportKind::SafeFtp;
        }
        self.preference.unwrap_or_else(|| Self::heuristic(target))
    }

    pub fn in_backoff(&self, now: DateTime<Utc>) -> bool {
        self.backoff_until.is_some_and(|until| now < until)
    }

    /// Returns `true` when the failure opened a backoff window
    ///
    /// A failed primary FTP attempt always downgrades the preference to safe
    /// FTP. A failed SFTP attempt leaves the `Sftp` preference in
    /// place: the caller still falls back to safe FTP for the current pass,
    /// but the next tick tries SFTP again, since safe FTP cannot stand in for
    /// an SSH-only server. A passive-mode mismatch on any transport pins safe
    /// FTP and opens the backoff window.
    pub fn record_failure(
        &mut self,
        kind: TransportKind,
        error: &TransportError,
        now: DateTime<Utc>,
    ) -> bool {
        if kind == TransportKind::PrimaryFtp {
            self.preference = Some(TransportKind::SafeFtp);
        }
        if error.is_passive_mode_mismatch() {
            self.backoff_until = Some(now + self.backoff);
            self.preference = Some(TransportKind::SafeFtp);
            return true;
        }
        false
    }

    pub fn record_success(&mut self, kind: TransportKind) {
        self.preference = Some(kind);
    }

    pub fn preference(&self) -> Option<TransportKind> {
        self.preference
    }

    pub fn backoff_until(&self) -> Option<DateTime<Utc>> {
        self.backoff_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str, port: u16) -> RemoteTarget {
        RemoteTarget {
            target_id: 1,
            server_name: None,
            host: host.to_string(),
            port,
            username: "u".to_string(),
            password: "p".to_string(),
            remote_dir: "/".to_string(),
            sentry_stats: false,
        }
    }

    #[test]
    fn test_heuristic() {
        let selector = TransportSelector::default();
        let now = Utc::now();
        assert_eq!(selector.choose(&target("10.0.0.1", 22), now), TransportKind::Sftp);
        assert_eq!(selector.choose(&target("SFTP.host.net", 2022), now), TransportKind::Sftp);
        assert_eq!(selector.choose(&target("ftp.host.net", 21), now), TransportKind::PrimaryFtp);
    }

    #[test]
    fn test_preference_overrides_heuristic() {
        let mut selector = TransportSelector::default();
        selector.record_success(TransportKind::SafeFtp);
        assert_eq!(selector.choose(&target("10.0.0.1", 22), Utc::now()), TransportKind::SafeFtp);
    }

    #[test]
    fn test_passive_mismatch_opens_backoff() {
        let mut selector = TransportSelector::default();
        let now = Utc::now();
        let err = TransportError::PassiveModeMismatch("Waiting for ('229',) but got 227".to_string());

        assert!(selector.record_failure(TransportKind::PrimaryFtp, &err, now));
        assert_eq!(selector.preference(), Some(TransportKind::SafeFtp));
        assert_eq!(selector.backoff_until(), Some(now + Duration::hours(24)));

        // Even a later primary success cannot win inside the window
        selector.record_success(TransportKind::PrimaryFtp);
        let t = target("ftp.host.net", 21);
        assert_eq!(selector.choose(&t, now + Duration::hours(23)), TransportKind::SafeFtp);
        assert_eq!(selector.choose(&t, now + Duration::hours(25)), TransportKind::PrimaryFtp);
    }

    #[test]
    fn test_generic_failure_downgrades_without_backoff() {
        let mut selector = TransportSelector::default();
        let now = Utc::now();
        let err = TransportError::Protocol("530 Login incorrect".to_string());

        assert!(!selector.record_failure(TransportKind::PrimaryFtp, &err, now));
        assert_eq!(selector.preference(), Some(TransportKind::SafeFtp));
        assert!(!selector.in_backoff(now));

        let mut sftp = TransportSelector::default();
        sftp.record_success(TransportKind::Sftp);
        let timeout = TransportError::Timeout {
            kind: TransportKind::Sftp,
            secs: 90,
        };
        assert!(!sftp.record_failure(TransportKind::Sftp, &timeout, now));
        assert_eq!(sftp.preference(), Some(TransportKind::Sftp));
    }
}
