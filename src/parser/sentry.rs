//! Destroyed-sentry log lines
//!
//! Duplicates are not filtered here; the `sentry_logs` unique key absorbs
//! re-parsed lines.

use super::parse_log_ts;
use crate::model::{DomainEvent, Position, SentryDestroyed};
use regex::Regex;
use std::sync::LazyLock;

static SENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<ts>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}):\s+\[Sentry\]\s+Was destroyed at the location:\s+X=(?P<x>-?\d+(?:\.\d+)?)\s+Y=(?P<y>-?\d+(?:\.\d+)?)\s+Z=(?P<z>-?\d+(?:\.\d+)?),\s+by:\s+(?P<killer>.+?)\((?P<steam>\d+)\),\s+using:\s+(?P<weapon>[^,]+),\s+last hit caused\s+(?P<damage>-?\d+(?:\.\d+)?)\s+damage\.$",
    )
    .expect("sentry pattern is valid")
});

pub fn parse_lines(lines: &[&str], target_id: i64) -> Vec<DomainEvent> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = SENTRY_RE.captures(line)?;
            Some(DomainEvent::SentryDestroyed(SentryDestroyed {
                target_id,
                timestamp: parse_log_ts(&caps["ts"]),
                attacker_steam_id: caps["steam"].to_string(),
                attacker_name: caps["killer"].trim().to_string(),
                weapon: caps["weapon"].trim().to_string(),
                damage: caps["damage"].parse().ok()?,
                position: Position {
                    x: caps["x"].parse().ok()?,
                    y: caps["y"].parse().ok()?,
                    z: caps["z"].parse().ok()?,
                },
                raw_line: line.to_string(),
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_sentry_line() {
        let line = "2024.03.01-10.00.00: [Sentry] Was destroyed at the location: X=-1200.5 Y=300 Z=12.25, by: Raider Rick(76561190000000001), using: M82A1, last hit caused 250.5 damage.";
        let events = parse_lines(&[line], 2);
        assert_eq!(events.len(), 1);

        let DomainEvent::SentryDestroyed(s) = &events[0] else {
            panic!("expected sentry event");
        };
        assert_eq!(s.attacker_steam_id, "76561190000000001");
        assert_eq!(s.attacker_name, "Raider Rick");
        assert_eq!(s.weapon, "M82A1");
        assert_eq!(s.damage, 250.5);
        assert_eq!(s.position, Position { x: -1200.5, y: 300.0, z: 12.25 });
    }

    #[test]
    fn test_requires_full_sentence() {
        let line = "2024.03.01-10.00.00: [Sentry] Was destroyed at the location: X=1 Y=2 Z=3, by: R(1), using: M82A1";
        assert!(parse_lines(&[line], 2).is_empty());
    }
}
