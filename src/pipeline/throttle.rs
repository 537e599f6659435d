//! Per-target warning rate limiting
//!
//! A permanently misconfigured server would otherwise print the same warning
//! every tick.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const WARN_SUPPRESS: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct WarnThrottle {
    window: Duration,
    suppressed_until: HashMap<&'static str, Instant>,
}

impl Default for WarnThrottle {
    fn default() -> Self {
        Self::new(WARN_SUPPRESS)
    }
}

impl WarnThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            suppressed_until: HashMap::new(),
        }
    }

    /// `true` if `key` may be logged at WARN now; arms the window if so
    pub fn allow(&mut self, key: &'static str, now: Instant) -> bool {
        match self.suppressed_until.get(key) {
            Some(until) if now < *until => false,
            _ => {
                self.suppressed_until.insert(key, now + self.window);
                true
            }
        }
    }

    /// WARN once per window, DEBUG for the repeats
    pub fn warn(&mut self, key: &'static str, label: &str, message: &str) {
        if self.allow(key, Instant::now()) {
            log::warn!("⚠️  [{}] {}", label, message);
        } else {
            log::debug!("[{}] {} (repeat suppressed)", label, message);
        }
    }
}
