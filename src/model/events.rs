//! Structured events produced by the log parsers
//!
//! One variant per log family. The persister matches on `DomainEvent`
//! exhaustively, so a new log family cannot be parsed without also deciding
//! how it is stored.

use chrono::NaiveDateTime;

/// Format used for every timestamp written to the store
pub const STORE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Player identity as it appears on a log line
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub steam_id: String,
    pub username: String,
    pub player_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub target_id: i64,
    pub timestamp: NaiveDateTime,
    pub actor: Actor,
    pub channel: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    In,
    Out,
}

impl LoginState {
    /// Status string stored in `login_logs.status`
    pub fn status(&self) -> &'static str {
        match self {
            LoginState::In => "logged in",
            LoginState::Out => "logged out",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoginState::In => "in",
            LoginState::Out => "out",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginTransition {
    pub target_id: i64,
    pub timestamp: NaiveDateTime,
    pub ip: String,
    pub actor: Actor,
    pub state: LoginState,
    pub position: Position,
}

/// Where a kill record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSource {
    /// Summary line, optionally enriched by a JSON detail line
    Summary,
    Suicide,
}

impl KillSource {
    /// Value of `kill_logs.src_tag`
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            KillSource::Summary => None,
            KillSource::Suicide => Some("SUICIDE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub target_id: i64,
    pub timestamp: NaiveDateTime,
    pub killer: Actor,
    pub victim: Actor,
    pub weapon: String,
    pub distance: Option<f64>,
    pub killer_position: Option<Position>,
    pub victim_position: Option<Position>,
    pub time_of_day: Option<String>,
    pub source: KillSource,
}

impl KillEvent {
    pub fn is_suicide(&self) -> bool {
        self.source == KillSource::Suicide
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminCommand {
    pub target_id: i64,
    pub timestamp: NaiveDateTime,
    pub actor: Actor,
    pub command: String,
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentryDestroyed {
    pub target_id: i64,
    pub timestamp: NaiveDateTime,
    pub attacker_steam_id: String,
    pub attacker_name: String,
    pub weapon: String,
    pub damage: f64,
    pub position: Position,
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Chat(ChatMessage),
    Login(LoginTransition),
    Kill(KillEvent),
    Admin(AdminCommand),
    SentryDestroyed(SentryDestroyed),
}

impl DomainEvent {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            DomainEvent::Chat(e) => e.timestamp,
            DomainEvent::Login(e) => e.timestamp,
            DomainEvent::Kill(e) => e.timestamp,
            DomainEvent::Admin(e) => e.timestamp,
            DomainEvent::SentryDestroyed(e) => e.timestamp,
        }
    }

    /// Short description recorded as the checkpoint's `last_message`
    pub fn checkpoint_message(&self) -> String {
        match self {
            DomainEvent::Chat(e) => e.message.clone(),
            DomainEvent::Login(e) => e.state.as_str().to_string(),
            DomainEvent::Kill(e) => {
                format!("{}->{}:{}", e.killer.steam_id, e.victim.steam_id, e.weapon)
            }
            DomainEvent::Admin(e) => e.command.clone(),
            DomainEvent::SentryDestroyed(e) => e.raw_line.trim().to_string(),
        }
    }
}

/// Render a log timestamp the way the store keeps it
pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(STORE_TS_FORMAT).to_string()
}
