//! Login log lines
//!
//! `<ts>: '<ip> <steamid>:<username>(<playerid>)' logged <in|out> at: X=<f> Y=<f> Z=<f>`

use super::parse_log_ts;
use crate::model::{Actor, DomainEvent, LoginState, LoginTransition, Position};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static LOGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<datetime>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}): '(?P<ip>\d+\.\d+\.\d+\.\d+)\s+(?P<steam_id>\d+):(?P<username>[^()]+)\((?P<player_id>\d+)\)' logged\s+(?P<state>in|out)\s+at:\s+X=(?P<x>[-\d\.]+)\s+Y=(?P<y>[-\d\.]+)\s+Z=(?P<z>[-\d\.]+)",
    )
    .expect("login pattern is valid")
});

pub fn parse_lines(lines: &[&str], target_id: i64) -> Vec<DomainEvent> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for line in lines {
        let Some(caps) = LOGIN_RE.captures(line) else {
            continue;
        };

        let parsed = (
            caps["player_id"].parse::<i64>(),
            caps["x"].parse::<f64>(),
            caps["y"].parse::<f64>(),
            caps["z"].parse::<f64>(),
        );
        let (Ok(player_id), Ok(x), Ok(y), Ok(z)) = parsed else {
            continue;
        };

        let state = if caps["state"].eq_ignore_ascii_case("in") {
            LoginState::In
        } else {
            LoginState::Out
        };

        let signature = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            &caps["datetime"],
            &caps["ip"],
            &caps["steam_id"],
            &caps["player_id"],
            state.as_str(),
            &caps["x"],
            &caps["y"],
            &caps["z"]
        );
        if !seen.insert(signature) {
            continue;
        }

        events.push(DomainEvent::Login(LoginTransition {
            target_id,
            timestamp: parse_log_ts(&caps["datetime"]),
            ip: caps["ip"].to_string(),
            actor: Actor {
                steam_id: caps["steam_id"].to_string(),
                username: caps["username"].to_string(),
                player_id: Some(player_id),
            },
            state,
            position: Position { x, y, z },
        }));
    }

    events
}
