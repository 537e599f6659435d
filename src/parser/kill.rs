//! Kill log lines
//!
//! Three shapes appear in a kill log:
//! - suicide lines, emitted immediately with killer == victim
//! - summary lines (`Died: … Killer: … Weapon: …`, optional `Distance: N m`)
//! - JSON detail lines carrying positions and time of day
//!
//! Summary and detail lines that share the exact timestamp text are joined
//! through a [`CorrelationBuffer`] that lives for one batch only. A detail
//! line without a summary in the same batch is dropped.

use super::parse_log_ts;
use crate::model::{Actor, DomainEvent, KillEvent, KillSource, Position};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SUICIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<dt>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}):\s*Comitted suicide\. User:\s*(?P<username>.+?)\s*\(\s*(?P<player_id>\d+)\s*,\s*(?P<steam_id>\d+)\s*\),.*?Location:\s*X=(?P<x>[-\d\.]+)\s+Y=(?P<y>[-\d\.]+)\s+Z=(?P<z>[-\d\.]+)",
    )
    .expect("suicide pattern is valid")
});

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<dt>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}):\s*Died:\s*(?P<v_name>.+?)\s*\((?P<v_sid>\d+)\),\s*Killer:\s*(?P<k_name>.+?)\s*\((?P<k_sid>\d+)\)\s*Weapon:\s*(?P<weapon>.+?)(?:\s+S|\s+C|\s+S\[|\s+C\[|$)",
    )
    .expect("kill summary pattern is valid")
});

static DISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Distance:\s*(?P<dist>\d+\.?\d*)\s*m").expect("distance pattern is valid")
});

static DETAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<dt>\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}):\s*(?P<json>\{.*\})$")
        .expect("kill detail pattern is valid")
});

#[derive(Debug, Clone)]
struct KillSummary {
    killer: Actor,
    victim: Actor,
    weapon: String,
    distance: Option<f64>,
}

#[derive(Debug, Default)]
struct KillDetail {
    killer_position: Option<Position>,
    victim_position: Option<Position>,
    time_of_day: Option<String>,
}

#[derive(Debug, Default)]
struct Slot {
    summary: Option<KillSummary>,
    detail: Option<KillDetail>,
}

/// Batch-scoped join of summary and detail lines keyed by timestamp text
#[derive(Debug, Default)]
pub struct CorrelationBuffer {
    slots: BTreeMap<String, Slot>,
}

impl CorrelationBuffer {
    fn put_summary(&mut self, ts: &str, summary: KillSummary) {
        self.slots.entry(ts.to_string()).or_default().summary = Some(summary);
    }

    fn put_detail(&mut self, ts: &str, detail: KillDetail) {
        self.slots.entry(ts.to_string()).or_default().detail = Some(detail);
    }

    /// One event per timestamp that has a summary line
    fn drain(self, target_id: i64) -> impl Iterator<Item = KillEvent> {
        self.slots.into_iter().filter_map(move |(ts, slot)| {
            let summary = slot.summary?;
            let detail = slot.detail.unwrap_or_default();
            Some(KillEvent {
                target_id,
                timestamp: parse_log_ts(&ts),
                killer: summary.killer,
                victim: summary.victim,
                weapon: summary.weapon,
                distance: summary.distance,
                killer_position: detail.killer_position,
                victim_position: detail.victim_position,
                time_of_day: detail.time_of_day,
                source: KillSource::Summary,
            })
        })
    }
}

pub fn parse_lines(lines: &[&str], target_id: i64) -> Vec<DomainEvent> {
    let mut events = Vec::new();
    let mut buffer = CorrelationBuffer::default();

    for line in lines {
        if let Some(caps) = SUICIDE_RE.captures(line) {
            if let Some(event) = suicide_event(&caps, target_id) {
                events.push(DomainEvent::Kill(event));
            }
            continue;
        }

        if let Some(caps) = DETAIL_RE.captures(line) {
            if let Ok(payload) = serde_json::from_str::<Value>(&caps["json"]) {
                buffer.put_detail(&caps["dt"], detail_from_json(&payload));
            }
            continue;
        }

        if let Some(caps) = SUMMARY_RE.captures(line) {
            let distance = DISTANCE_RE
                .captures(line)
                .and_then(|d| d["dist"].parse::<f64>().ok());

            buffer.put_summary(
                &caps["dt"],
                KillSummary {
                    killer: Actor {
                        steam_id: caps["k_sid"].to_string(),
                        username: caps["k_name"].trim().to_string(),
                        player_id: None,
                    },
                    victim: Actor {
                        steam_id: caps["v_sid"].to_string(),
                        username: caps["v_name"].trim().to_string(),
                        player_id: None,
                    },
                    weapon: caps["weapon"].trim().to_string(),
                    distance,
                },
            );
        }
    }

    events.extend(buffer.drain(target_id).map(DomainEvent::Kill));
    events
}

fn suicide_event(caps: &regex::Captures<'_>, target_id: i64) -> Option<KillEvent> {
    let player_id = caps["player_id"].parse::<i64>().ok()?;
    let position = Position {
        x: caps["x"].parse().ok()?,
        y: caps["y"].parse().ok()?,
        z: caps["z"].parse().ok()?,
    };
    let actor = Actor {
        steam_id: caps["steam_id"].to_string(),
        username: caps["username"].trim().to_string(),
        player_id: Some(player_id),
    };

    Some(KillEvent {
        target_id,
        timestamp: parse_log_ts(&caps["dt"]),
        killer: actor.clone(),
        victim: actor,
        weapon: "Suicide".to_string(),
        distance: None,
        killer_position: Some(position),
        victim_position: Some(position),
        time_of_day: None,
        source: KillSource::Suicide,
    })
}

fn detail_from_json(payload: &Value) -> KillDetail {
    KillDetail {
        killer_position: server_location(&payload["Killer"]),
        victim_position: server_location(&payload["Victim"]),
        time_of_day: match &payload["TimeOfDay"] {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
    }
}

fn server_location(actor: &Value) -> Option<Position> {
    let loc = &actor["ServerLocation"];
    Some(Position {
        x: loc["X"].as_f64()?,
        y: loc["Y"].as_f64()?,
        z: loc["Z"].as_f64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "2024.03.01-20.15.42: Died: Victim Vic (76561198000000002), Killer: Killer Kay (76561198000000001) Weapon: SDASS S[KillerLoc : 1.0, 2.0, 3.0 VictimLoc : 4.0, 5.0, 6.0, Distance: 120.5 m]";
    const DETAIL: &str = r#"2024.03.01-20.15.42: {"Killer":{"ServerLocation":{"X":10.5,"Y":20.0,"Z":30.0},"ProfileName":"Killer Kay"},"Victim":{"ServerLocation":{"X":40.0,"Y":50.0,"Z":60.0}},"TimeOfDay":"14:03:11"}"#;

    fn kills(events: &[DomainEvent]) -> Vec<&KillEvent> {
        events
            .iter()
            .map(|e| match e {
                DomainEvent::Kill(k) => k,
                other => panic!("unexpected event {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_summary_and_detail_correlate_into_one_event() {
        let events = parse_lines(&[DETAIL, SUMMARY], 1);
        let kills = kills(&events);
        assert_eq!(kills.len(), 1);

        let kill = kills[0];
        assert_eq!(kill.killer.steam_id, "76561198000000001");
        assert_eq!(kill.killer.username, "Killer Kay");
        assert_eq!(kill.victim.steam_id, "76561198000000002");
        assert_eq!(kill.victim.username, "Victim Vic");
        assert_eq!(kill.weapon, "SDASS");
        assert_eq!(kill.distance, Some(120.5));
        assert_eq!(kill.killer_position, Some(Position { x: 10.5, y: 20.0, z: 30.0 }));
        assert_eq!(kill.victim_position, Some(Position { x: 40.0, y: 50.0, z: 60.0 }));
        assert_eq!(kill.time_of_day.as_deref(), Some("14:03:11"));
        assert_eq!(kill.source, KillSource::Summary);
    }

    #[test]
    fn test_summary_without_detail_still_emits() {
        let events = parse_lines(&[SUMMARY], 1);
        let kills = kills(&events);
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].killer_position, None);
        assert_eq!(kills[0].time_of_day, None);
    }

    #[test]
    fn test_detail_without_summary_is_discarded() {
        assert!(parse_lines(&[DETAIL], 1).is_empty());
    }

    #[test]
    fn test_malformed_detail_json_is_ignored() {
        let broken = "2024.03.01-20.15.42: {\"Killer\": {\"ServerLocation\": }";
        let events = parse_lines(&[broken, SUMMARY], 1);
        assert_eq!(kills(&events).len(), 1);
    }

    #[test]
    fn test_suicide_emits_immediately() {
        let line = "2024.03.01-21.00.00: Comitted suicide. User: Sad Sam (17, 76561198000000003), Location: X=-1.5 Y=2.5 Z=3.5";
        let events = parse_lines(&[line, SUMMARY], 1);
        let kills = kills(&events);
        assert_eq!(kills.len(), 2);

        let suicide = kills[0];
        assert!(suicide.is_suicide());
        assert_eq!(suicide.weapon, "Suicide");
        assert_eq!(suicide.killer, suicide.victim);
        assert_eq!(suicide.killer.player_id, Some(17));
        assert_eq!(suicide.victim_position, Some(Position { x: -1.5, y: 2.5, z: 3.5 }));
        assert_eq!(suicide.source.tag(), Some("SUICIDE"));
    }

    #[test]
    fn test_distinct_timestamps_yield_distinct_events() {
        let other = SUMMARY.replace("20.15.42", "20.16.00");
        let events = parse_lines(&[SUMMARY, other.as_str()], 1);
        assert_eq!(kills(&events).len(), 2);
    }
}
