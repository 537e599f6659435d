//! Admin command log lines
//!
//! `<date>-<time>: '<steamid>:<username>(<playerid>)' Command: '<text>'`

use super::parse_log_ts;
use crate::model::{Actor, AdminCommand, DomainEvent};
use regex::Regex;
use std::sync::LazyLock;

static ADMIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<date>\d{4}\.\d{2}\.\d{2})-(?P<time>\d{2}\.\d{2}\.\d{2}):\s+'(?P<steam_id>\d+):(?P<username>[^()]+)\((?P<player_id>\d+)\)'\s+Command:\s+'(?P<command>.+)'$",
    )
    .expect("admin pattern is valid")
});

pub fn parse_lines(lines: &[&str], target_id: i64) -> Vec<DomainEvent> {
    lines
        .iter()
        .filter_map(|line| {
            let caps = ADMIN_RE.captures(line)?;
            let player_id = caps["player_id"].parse::<i64>().ok()?;
            let stamp = format!("{}-{}", &caps["date"], &caps["time"]);

            Some(DomainEvent::Admin(AdminCommand {
                target_id,
                timestamp: parse_log_ts(&stamp),
                actor: Actor {
                    steam_id: caps["steam_id"].to_string(),
                    username: caps["username"].to_string(),
                    player_id: Some(player_id),
                },
                command: caps["command"].to_string(),
                raw_line: line.to_string(),
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_admin_command() {
        let line = "2024.03.01-09.30.15: '76561198000000009:Admin Al(5)' Command: 'SpawnItem Weapon_AK47 1'";
        let events = parse_lines(&[line], 11);
        assert_eq!(events.len(), 1);

        let DomainEvent::Admin(cmd) = &events[0] else {
            panic!("expected admin event");
        };
        assert_eq!(cmd.target_id, 11);
        assert_eq!(cmd.actor.username, "Admin Al");
        assert_eq!(cmd.actor.player_id, Some(5));
        assert_eq!(cmd.command, "SpawnItem Weapon_AK47 1");
        assert_eq!(cmd.raw_line, line);
        assert_eq!(cmd.timestamp.format("%H:%M:%S").to_string(), "09:30:15");
    }

    #[test]
    fn test_ignores_unrelated_lines() {
        let line = "2024.03.01-09.30.15: Game version: 0.9.5.1234 (something else)";
        assert!(parse_lines(&[line], 11).is_empty());
    }
}
