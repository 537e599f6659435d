//! Chat log lines
//!
//! `<ts>: '<steamid>:<username>(<playerid>)' '<CHANNEL>: <message>'`

use super::parse_log_ts;
use crate::model::{Actor, ChatMessage, DomainEvent};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CHAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<datetime>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}): '(?P<steam_id>\d+):(?P<username>[^(]+)\((?P<player_id>\d+)\)' '(?P<chat_type>\w+): (?P<message>.+)'",
    )
    .expect("chat pattern is valid")
});

pub fn parse_lines(lines: &[&str], target_id: i64) -> Vec<DomainEvent> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for line in lines {
        let Some(caps) = CHAT_RE.captures(line) else {
            continue;
        };
        let Ok(player_id) = caps["player_id"].parse::<i64>() else {
            continue;
        };

        let signature = format!(
            "{}|{}|{}|{}|{}|{}",
            &caps["datetime"],
            &caps["steam_id"],
            &caps["username"],
            &caps["player_id"],
            &caps["chat_type"],
            &caps["message"]
        );
        if !seen.insert(signature) {
            continue;
        }

        events.push(DomainEvent::Chat(ChatMessage {
            target_id,
            timestamp: parse_log_ts(&caps["datetime"]),
            actor: Actor {
                steam_id: caps["steam_id"].to_string(),
                username: caps["username"].to_string(),
                player_id: Some(player_id),
            },
            channel: caps["chat_type"].to_string(),
            message: caps["message"].to_string(),
        }));
    }

    events
}
