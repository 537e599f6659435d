//! `steam_ban_events` access

use super::{SqliteStore, StoreError};
use rusqlite::params;

/// Ban flags for one player as reported by the Steam API
#[derive(Debug, Clone, PartialEq)]
pub struct BanRecord {
    pub vac_banned: bool,
    pub game_bans: i64,
    pub community_banned: bool,
    pub economy_ban: String,
    pub days_since_last_ban: i64,
    pub raw_json: String,
}

impl BanRecord {
    pub fn is_flagged(&self) -> bool {
        self.vac_banned || self.game_bans > 0 || self.community_banned || self.economy_ban != "none"
    }

    /// Stable signature used to avoid recording the same ban state twice
    pub fn signature(&self) -> String {
        format!(
            "vac={}|games={}|comm={}|econ={}|days={}",
            self.vac_banned as i32,
            self.game_bans,
            self.community_banned as i32,
            self.economy_ban,
            self.days_since_last_ban
        )
    }
}

impl SqliteStore {
    /// Insert a ban event unless the same signature is already recorded
    ///
    /// Returns `true` when a row was written.
    pub fn record_ban_event(
        &self,
        target_id: i64,
        steam_id: &str,
        username: Option<&str>,
        ban: &BanRecord,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let sig = ban.signature();

        let exists = conn
            .prepare(
                "SELECT id FROM steam_ban_events WHERE target_id = ?1 AND steam_id = ?2 AND sig = ?3 LIMIT 1",
            )?
            .exists(params![target_id, steam_id, sig])?;
        if exists {
            return Ok(false);
        }

        conn.execute(
            r#"
            INSERT INTO steam_ban_events (
                target_id, steam_id, username,
                vac_banned, game_bans, community_banned,
                economy_ban, days_since_last_ban, sig, raw_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                target_id,
                steam_id,
                username,
                ban.vac_banned,
                ban.game_bans,
                ban.community_banned,
                ban.economy_ban,
                ban.days_since_last_ban,
                sig,
                ban.raw_json,
            ],
        )?;
        Ok(true)
    }
}
