//! Batch persistence: append facts, maintain running aggregates
//!
//! Tables written (see `sql/`):
//! - `chat_logs`, `admin_logs`, `kill_logs` - INSERT (append-only)
//! - `sentry_logs` - INSERT OR IGNORE (unique key absorbs re-parses)
//! - `login_logs` - UPSERT on (target, steam id), last write wins
//! - `player_statistics`, `weapon_stats` - incremental UPDATE/UPSERT
//! - `parsed_logs` - checkpoint UPSERT, same transaction as the facts
//!
//! Aggregates are only ever nudged by the event being stored; they are never
//! recomputed from the fact tables.

use super::checkpoints::upsert_checkpoint;
use super::registration::link_from_chat;
use super::{SqliteStore, StoreError};
use crate::model::events::format_ts;
use crate::model::{
    AdminCommand, Actor, ChatMessage, DomainEvent, KillEvent, LoginTransition, RemoteTarget,
    SentryDestroyed,
};
use crate::parser::ParsedBatch;
use async_trait::async_trait;
use rusqlite::{params, Connection};

/// What one committed batch changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitSummary {
    pub facts: usize,
    pub duplicates: usize,
    pub links: usize,
}

/// Writes a parsed batch and its checkpoint as one unit of work
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Persist every event of `batch` and advance the checkpoint
    ///
    /// On error nothing from the batch is visible and the checkpoint keeps
    /// its previous value.
    async fn commit_batch(
        &self,
        target: &RemoteTarget,
        batch: &ParsedBatch,
    ) -> Result<CommitSummary, StoreError>;
}

#[async_trait]
impl EventSink for SqliteStore {
    async fn commit_batch(
        &self,
        target: &RemoteTarget,
        batch: &ParsedBatch,
    ) -> Result<CommitSummary, StoreError> {
        // No await point between BEGIN and COMMIT: a cancelled caller can
        // never leave half a batch behind.
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut summary = CommitSummary::default();

        for event in &batch.events {
            match event {
                DomainEvent::Chat(chat) => {
                    insert_chat(&tx, chat)?;
                    if link_from_chat(&tx, target.target_id, chat)? {
                        summary.links += 1;
                    }
                    summary.facts += 1;
                }
                DomainEvent::Login(login) => {
                    upsert_login(&tx, login)?;
                    summary.facts += 1;
                }
                DomainEvent::Kill(kill) => {
                    record_kill(&tx, kill)?;
                    summary.facts += 1;
                }
                DomainEvent::Admin(cmd) => {
                    insert_admin(&tx, cmd)?;
                    summary.facts += 1;
                }
                DomainEvent::SentryDestroyed(sentry) => {
                    if record_sentry(&tx, sentry, target.sentry_stats)? {
                        summary.facts += 1;
                    } else {
                        summary.duplicates += 1;
                    }
                }
            }
        }

        upsert_checkpoint(&tx, target.target_id, batch.log_type, &batch.checkpoint)?;
        tx.commit()?;

        log::debug!(
            "✅ Committed {} {} facts for target {} (line {})",
            summary.facts,
            batch.log_type,
            target.target_id,
            batch.checkpoint.last_line
        );
        Ok(summary)
    }
}

fn insert_chat(conn: &Connection, chat: &ChatMessage) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO chat_logs (target_id, date, time, steam_id, username, player_id, chat_type, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            chat.target_id,
            chat.timestamp.format("%Y-%m-%d").to_string(),
            chat.timestamp.format("%H:%M:00").to_string(),
            chat.actor.steam_id,
            chat.actor.username,
            chat.actor.player_id,
            chat.channel,
            chat.message,
        ],
    )?;
    Ok(())
}

fn upsert_login(conn: &Connection, login: &LoginTransition) -> Result<(), StoreError> {
    conn.execute(
        r#"
        INSERT INTO login_logs (target_id, steam_id, username, player_id, ip, status, x, y, z, last_seen)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(target_id, steam_id) DO UPDATE SET
            username = excluded.username,
            player_id = excluded.player_id,
            ip = excluded.ip,
            status = excluded.status,
            x = excluded.x,
            y = excluded.y,
            z = excluded.z,
            last_seen = excluded.last_seen
        "#,
        params![
            login.target_id,
            login.actor.steam_id,
            login.actor.username,
            login.actor.player_id,
            login.ip,
            login.state.status(),
            login.position.x,
            login.position.y,
            login.position.z,
            login.timestamp.format("%Y-%m-%d %H:%M:00").to_string(),
        ],
    )?;
    Ok(())
}

fn insert_admin(conn: &Connection, cmd: &AdminCommand) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO admin_logs (target_id, ts, steam_id, username, player_id, command, raw_line)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cmd.target_id,
            format_ts(&cmd.timestamp),
            cmd.actor.steam_id,
            cmd.actor.username,
            cmd.actor.player_id,
            cmd.command,
            cmd.raw_line,
        ],
    )?;
    Ok(())
}

/// Returns `false` when the unique key rejected the row as a duplicate
fn record_sentry(
    conn: &Connection,
    sentry: &SentryDestroyed,
    count_toward_stats: bool,
) -> Result<bool, StoreError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO sentry_logs
            (target_id, ts, killer_steam_id, killer_username, weapon, damage, x, y, z, raw_line)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            sentry.target_id,
            format_ts(&sentry.timestamp),
            sentry.attacker_steam_id,
            sentry.attacker_name,
            sentry.weapon,
            sentry.damage,
            sentry.position.x,
            sentry.position.y,
            sentry.position.z,
            sentry.raw_line,
        ],
    )? == 1;

    if inserted && count_toward_stats && !sentry.attacker_steam_id.is_empty() {
        ensure_player(conn, sentry.target_id, &sentry.attacker_steam_id, Some(sentry.attacker_name.as_str()))?;
        conn.execute(
            "UPDATE player_statistics SET sentry_kills = sentry_kills + 1
             WHERE target_id = ?1 AND steam_id = ?2",
            params![sentry.target_id, sentry.attacker_steam_id],
        )?;
    }

    Ok(inserted)
}

fn record_kill(conn: &Connection, kill: &KillEvent) -> Result<(), StoreError> {
    let ts = format_ts(&kill.timestamp);
    conn.execute(
        r#"
        INSERT INTO kill_logs (
            target_id, ts,
            killer_steam_id, killer_username, killer_player_id,
            victim_steam_id, victim_username, victim_player_id,
            weapon, distance,
            killer_x, killer_y, killer_z,
            victim_x, victim_y, victim_z,
            time_of_day, src_tag
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
        params![
            kill.target_id,
            ts,
            kill.killer.steam_id,
            kill.killer.username,
            kill.killer.player_id,
            kill.victim.steam_id,
            kill.victim.username,
            kill.victim.player_id,
            kill.weapon,
            kill.distance,
            kill.killer_position.map(|p| p.x),
            kill.killer_position.map(|p| p.y),
            kill.killer_position.map(|p| p.z),
            kill.victim_position.map(|p| p.x),
            kill.victim_position.map(|p| p.y),
            kill.victim_position.map(|p| p.z),
            kill.time_of_day,
            kill.source.tag(),
        ],
    )?;

    // Victim always takes the death, suicides included
    add_death(conn, kill.target_id, &kill.victim)?;

    if kill.is_suicide() {
        return Ok(());
    }

    add_kill(conn, kill, &ts)
}

fn add_death(conn: &Connection, target_id: i64, victim: &Actor) -> Result<(), StoreError> {
    if victim.steam_id.is_empty() {
        return Ok(());
    }
    ensure_player(conn, target_id, &victim.steam_id, Some(victim.username.as_str()))?;
    conn.execute(
        "UPDATE player_statistics SET deaths = deaths + 1 WHERE target_id = ?1 AND steam_id = ?2",
        params![target_id, victim.steam_id],
    )?;
    update_kd_ratio(conn, target_id, &victim.steam_id)
}

fn add_kill(conn: &Connection, kill: &KillEvent, ts: &str) -> Result<(), StoreError> {
    let killer = &kill.killer;
    if killer.steam_id.is_empty() {
        return Ok(());
    }
    let distance = kill.distance.unwrap_or(0.0);
    let weapon = match kill.weapon.trim() {
        "" => "Unknown",
        w => w,
    };

    ensure_player(conn, kill.target_id, &killer.steam_id, Some(killer.username.as_str()))?;
    conn.execute(
        "UPDATE player_statistics
         SET kills = kills + 1, longest_kill = MAX(longest_kill, ?1)
         WHERE target_id = ?2 AND steam_id = ?3",
        params![distance, kill.target_id, killer.steam_id],
    )?;

    conn.execute(
        r#"
        INSERT INTO weapon_stats (
            target_id, steam_id, weapon,
            kills, longest_kill, total_distance, first_kill_ts, last_kill_ts
        ) VALUES (?1, ?2, ?3, 1, ?4, ?4, ?5, ?5)
        ON CONFLICT(target_id, steam_id, weapon) DO UPDATE SET
            kills = kills + 1,
            longest_kill = MAX(longest_kill, excluded.longest_kill),
            total_distance = total_distance + excluded.total_distance,
            last_kill_ts = excluded.last_kill_ts
        "#,
        params![kill.target_id, killer.steam_id, weapon, distance, ts],
    )?;

    // Most kills, then longest kill, then most recent
    conn.execute(
        "UPDATE player_statistics
         SET favorite_weapon = (
             SELECT weapon FROM weapon_stats
             WHERE target_id = ?1 AND steam_id = ?2
             ORDER BY kills DESC, longest_kill DESC, last_kill_ts DESC
             LIMIT 1
         )
         WHERE target_id = ?1 AND steam_id = ?2",
        params![kill.target_id, killer.steam_id],
    )?;

    update_kd_ratio(conn, kill.target_id, &killer.steam_id)
}

/// Zero-initialised aggregate row; keeps an existing username when none is given
fn ensure_player(
    conn: &Connection,
    target_id: i64,
    steam_id: &str,
    username: Option<&str>,
) -> Result<(), StoreError> {
    let username = username.map(str::trim).filter(|name| !name.is_empty());
    conn.execute(
        "INSERT INTO player_statistics (target_id, steam_id, username) VALUES (?1, ?2, ?3)
         ON CONFLICT(target_id, steam_id) DO UPDATE SET
             username = COALESCE(excluded.username, player_statistics.username)",
        params![target_id, steam_id, username],
    )?;
    Ok(())
}

fn update_kd_ratio(conn: &Connection, target_id: i64, steam_id: &str) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE player_statistics
         SET kd_ratio = CASE WHEN deaths = 0 THEN kills ELSE CAST(kills AS REAL) / deaths END
         WHERE target_id = ?1 AND steam_id = ?2",
        params![target_id, steam_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Checkpoint, KillSource, LogType, Position};
    use crate::store::CheckpointStore;
    use chrono::NaiveDateTime;
    use tempfile::NamedTempFile;

    const KILLER: &str = "76561198000000001";
    const VICTIM: &str = "76561198000000002";

    fn test_store() -> (NamedTempFile, SqliteStore, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteStore::open(temp_file.path(), "sql").unwrap();
        let reader = Connection::open(temp_file.path()).unwrap();
        (temp_file, store, reader)
    }

    fn target(sentry_stats: bool) -> RemoteTarget {
        RemoteTarget {
            target_id: 1,
            server_name: None,
            host: "ftp.example.net".to_string(),
            port: 21,
            username: "u".to_string(),
            password: "p".to_string(),
            remote_dir: "/logs".to_string(),
            sentry_stats,
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn actor(steam_id: &str, name: &str) -> Actor {
        Actor {
            steam_id: steam_id.to_string(),
            username: name.to_string(),
            player_id: None,
        }
    }

    fn kill(killer: &str, victim: &str, weapon: &str, distance: f64, at: &str) -> DomainEvent {
        DomainEvent::Kill(KillEvent {
            target_id: 1,
            timestamp: ts(at),
            killer: actor(killer, "K"),
            victim: actor(victim, "V"),
            weapon: weapon.to_string(),
            distance: Some(distance),
            killer_position: None,
            victim_position: None,
            time_of_day: None,
            source: KillSource::Summary,
        })
    }

    fn batch(log_type: LogType, events: Vec<DomainEvent>, last_line: i64) -> ParsedBatch {
        ParsedBatch {
            log_type,
            file_name: format!("{}_1.log", log_type),
            scanned: events.len(),
            events,
            checkpoint: Checkpoint {
                last_file: Some(format!("{}_1.log", log_type)),
                last_line,
                last_file_size: Some(100),
                ..Checkpoint::default()
            },
        }
    }

    /// (kills, deaths, longest_kill, favorite_weapon, kd_ratio, sentry_kills)
    fn player(conn: &Connection, steam_id: &str) -> (i64, i64, f64, Option<String>, f64, i64) {
        conn.query_row(
            "SELECT kills, deaths, longest_kill, favorite_weapon, kd_ratio, sentry_kills
             FROM player_statistics WHERE target_id = 1 AND steam_id = ?1",
            [steam_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
        )
        .unwrap()
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[tokio::test]
    async fn test_first_kill_scenario() {
        let (_temp, store, reader) = test_store();
        reader
            .execute(
                "INSERT INTO player_statistics (target_id, steam_id, username, deaths, kd_ratio) VALUES (1, ?1, 'V', 1, 0)",
                [VICTIM],
            )
            .unwrap();

        let b = batch(LogType::Kill, vec![kill(KILLER, VICTIM, "SDASS", 120.5, "2024-03-01 20:15:42")], 4);
        store.commit_batch(&target(false), &b).await.unwrap();

        let (kills, deaths, longest, favorite, kd, _) = player(&reader, KILLER);
        assert_eq!((kills, deaths), (1, 0));
        assert_eq!(longest, 120.5);
        assert_eq!(favorite.as_deref(), Some("SDASS"));
        assert_eq!(kd, 1.0);

        let (v_kills, v_deaths, _, _, v_kd, _) = player(&reader, VICTIM);
        assert_eq!((v_kills, v_deaths), (0, 2));
        assert_eq!(v_kd, 0.0);

        let weapon: (i64, f64, f64) = reader
            .query_row(
                "SELECT kills, longest_kill, total_distance FROM weapon_stats WHERE steam_id = ?1 AND weapon = 'SDASS'",
                [KILLER],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(weapon, (1, 120.5, 120.5));

        let cp_line: i64 = count(&reader, "SELECT last_line FROM parsed_logs WHERE target_id = 1 AND log_type = 'kill'");
        assert_eq!(cp_line, 4);
    }

    #[tokio::test]
    async fn test_favorite_weapon_tie_breaks() {
        let (_temp, store, reader) = test_store();
        let events = vec![
            kill(KILLER, VICTIM, "AK47", 50.0, "2024-03-01 10:00:00"),
            kill(KILLER, VICTIM, "M82A1", 300.0, "2024-03-01 10:01:00"),
        ];
        store.commit_batch(&target(false), &batch(LogType::Kill, events, 1)).await.unwrap();
        // One kill each: longer kill wins
        assert_eq!(player(&reader, KILLER).3.as_deref(), Some("M82A1"));

        let events = vec![
            kill(KILLER, VICTIM, "AK47", 10.0, "2024-03-01 10:02:00"),
        ];
        store.commit_batch(&target(false), &batch(LogType::Kill, events, 2)).await.unwrap();
        // Two AK kills beat one long M82 kill
        assert_eq!(player(&reader, KILLER).3.as_deref(), Some("AK47"));

        let (kills, _, longest, _, kd, _) = player(&reader, KILLER);
        assert_eq!(kills, 3);
        assert_eq!(longest, 300.0);
        assert_eq!(kd, 3.0);

        let total: f64 = reader
            .query_row(
                "SELECT total_distance FROM weapon_stats WHERE steam_id = ?1 AND weapon = 'AK47'",
                [KILLER],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(total, 60.0);
    }

    #[tokio::test]
    async fn test_suicide_only_counts_a_death() {
        let (_temp, store, reader) = test_store();
        let me = actor(KILLER, "Sad");
        let suicide = DomainEvent::Kill(KillEvent {
            target_id: 1,
            timestamp: ts("2024-03-01 11:00:00"),
            killer: me.clone(),
            victim: me,
            weapon: "Suicide".to_string(),
            distance: None,
            killer_position: Some(Position { x: 1.0, y: 2.0, z: 3.0 }),
            victim_position: Some(Position { x: 1.0, y: 2.0, z: 3.0 }),
            time_of_day: None,
            source: KillSource::Suicide,
        });

        store.commit_batch(&target(false), &batch(LogType::Kill, vec![suicide], 0)).await.unwrap();

        let (kills, deaths, _, favorite, kd, _) = player(&reader, KILLER);
        assert_eq!((kills, deaths), (0, 1));
        assert_eq!(favorite, None);
        assert_eq!(kd, 0.0);
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM weapon_stats"), 0);
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM kill_logs WHERE src_tag = 'SUICIDE'"), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_batch_rolls_back_everything() {
        let (_temp, store, reader) = test_store();
        let previous = Checkpoint {
            last_file: Some("kill_1.log".to_string()),
            last_line: 7,
            last_file_size: Some(50),
            ..Checkpoint::default()
        };
        store.set_checkpoint(1, LogType::Kill, &previous).unwrap();

        // Simulated datastore failure on the second kill of the batch
        reader
            .execute_batch(
                "CREATE TRIGGER fail_second_kill BEFORE INSERT ON kill_logs
                 WHEN NEW.victim_steam_id = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'simulated datastore failure'); END;",
            )
            .unwrap();

        let events = vec![
            kill(KILLER, VICTIM, "AK47", 10.0, "2024-03-01 10:00:00"),
            kill(KILLER, "boom", "AK47", 20.0, "2024-03-01 10:00:01"),
            kill(KILLER, VICTIM, "AK47", 30.0, "2024-03-01 10:00:02"),
        ];
        let result = store.commit_batch(&target(false), &batch(LogType::Kill, events, 10)).await;
        assert!(result.is_err());

        assert_eq!(count(&reader, "SELECT COUNT(*) FROM kill_logs"), 0);
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM player_statistics"), 0);
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM weapon_stats"), 0);
        assert_eq!(
            count(&reader, "SELECT last_line FROM parsed_logs WHERE target_id = 1 AND log_type = 'kill'"),
            7
        );
    }

    #[tokio::test]
    async fn test_login_upsert_last_write_wins() {
        let (_temp, store, reader) = test_store();
        let login = |state, at: &str, x: f64| {
            DomainEvent::Login(LoginTransition {
                target_id: 1,
                timestamp: ts(at),
                ip: "10.0.0.5".to_string(),
                actor: Actor {
                    steam_id: KILLER.to_string(),
                    username: "Joe".to_string(),
                    player_id: Some(42),
                },
                state,
                position: Position { x, y: 0.0, z: 0.0 },
            })
        };
        let events = vec![
            login(crate::model::LoginState::In, "2024-03-01 18:00:10", 1.0),
            login(crate::model::LoginState::Out, "2024-03-01 19:30:45", 2.0),
        ];
        store.commit_batch(&target(false), &batch(LogType::Login, events, 1)).await.unwrap();

        let (status, x, last_seen): (String, f64, String) = reader
            .query_row(
                "SELECT status, x, last_seen FROM login_logs WHERE target_id = 1 AND steam_id = ?1",
                [KILLER],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(status, "logged out");
        assert_eq!(x, 2.0);
        assert_eq!(last_seen, "2024-03-01 19:30:00");
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM login_logs"), 1);
    }

    fn sentry(at: &str) -> DomainEvent {
        DomainEvent::SentryDestroyed(SentryDestroyed {
            target_id: 1,
            timestamp: ts(at),
            attacker_steam_id: KILLER.to_string(),
            attacker_name: "Raider".to_string(),
            weapon: "M82A1".to_string(),
            damage: 250.0,
            position: Position { x: 1.0, y: 2.0, z: 3.0 },
            raw_line: "raw".to_string(),
        })
    }

    #[tokio::test]
    async fn test_sentry_duplicates_and_stats_flag() {
        let (_temp, store, reader) = test_store();

        let events = vec![sentry("2024-03-01 10:00:00"), sentry("2024-03-01 10:00:00")];
        let summary = store
            .commit_batch(&target(true), &batch(LogType::Sentry, events, 1))
            .await
            .unwrap();
        assert_eq!(summary.facts, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(player(&reader, KILLER).5, 1);

        // Flag off: fact stored, counter untouched
        let events = vec![sentry("2024-03-01 11:00:00")];
        store.commit_batch(&target(false), &batch(LogType::Sentry, events, 2)).await.unwrap();
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM sentry_logs"), 2);
        assert_eq!(player(&reader, KILLER).5, 1);
    }

    #[tokio::test]
    async fn test_chat_registration_links_pending_record() {
        let (_temp, store, reader) = test_store();
        reader
            .execute(
                "INSERT INTO pending_links (target_id, discord_id, code) VALUES (1, '998877', 'SCUMBot-AB12CD-9ZXY01')",
                [],
            )
            .unwrap();

        let chat = DomainEvent::Chat(ChatMessage {
            target_id: 1,
            timestamp: ts("2024-03-01 18:22:05"),
            actor: Actor {
                steam_id: KILLER.to_string(),
                username: "Joe".to_string(),
                player_id: Some(42),
            },
            channel: "Global".to_string(),
            message: "my code scumbot-ab12cd-9zxy01".to_string(),
        });

        let summary = store
            .commit_batch(&target(false), &batch(LogType::Chat, vec![chat.clone()], 0))
            .await
            .unwrap();
        assert_eq!(summary.links, 1);

        let (discord, name): (String, String) = reader
            .query_row(
                "SELECT discord_id, username FROM player_statistics WHERE target_id = 1 AND steam_id = ?1",
                [KILLER],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((discord.as_str(), name.as_str()), ("998877", "Joe"));
        assert_eq!(count(&reader, "SELECT linked FROM pending_links"), 1);

        let (date, time): (String, String) = reader
            .query_row("SELECT date, time FROM chat_logs", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_eq!((date.as_str(), time.as_str()), ("2024-03-01", "18:22:00"));

        // Already linked: second sighting is a plain chat row
        let summary = store
            .commit_batch(&target(false), &batch(LogType::Chat, vec![chat], 1))
            .await
            .unwrap();
        assert_eq!(summary.links, 0);
        assert_eq!(count(&reader, "SELECT COUNT(*) FROM chat_logs"), 2);
    }
}
