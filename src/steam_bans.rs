//! Steam Web API ban lookups for players who just logged in
//!
//! ## API Reference
//!
//! Endpoint: https://api.steampowered.com/ISteamUser/GetPlayerBans/v1/
//! Returns: `{"players": [{SteamId, VACBanned, NumberOfGameBans, ...}]}`
//!
//! Lookups run after the login batch commits and never affect ingestion.

use crate::store::{BanRecord, SqliteStore, StoreError};
use serde::Deserialize;
use std::time::Duration;

const GET_PLAYER_BANS_URL: &str = "https://api.steampowered.com/ISteamUser/GetPlayerBans/v1/";

#[derive(Debug, thiserror::Error)]
pub enum BanLookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Steam API returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Deserialize)]
struct PlayerBansResponse {
    #[serde(default)]
    players: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PlayerBans {
    #[serde(rename = "VACBanned", default)]
    vac_banned: bool,
    #[serde(rename = "NumberOfGameBans", default)]
    number_of_game_bans: i64,
    #[serde(rename = "CommunityBanned", default)]
    community_banned: bool,
    #[serde(rename = "EconomyBan", default)]
    economy_ban: Option<String>,
    #[serde(rename = "DaysSinceLastBan", default)]
    days_since_last_ban: i64,
}

/// Map one `players[]` entry of the API response
pub fn ban_record_from_json(player: &serde_json::Value) -> Option<BanRecord> {
    let bans: PlayerBans = serde_json::from_value(player.clone()).ok()?;
    Some(BanRecord {
        vac_banned: bans.vac_banned,
        game_bans: bans.number_of_game_bans,
        community_banned: bans.community_banned,
        economy_ban: bans
            .economy_ban
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "none".to_string())
            .to_lowercase(),
        days_since_last_ban: bans.days_since_last_ban,
        raw_json: player.to_string(),
    })
}

#[derive(Clone)]
pub struct BanScanner {
    client: reqwest::Client,
    api_key: String,
    store: SqliteStore,
}

impl BanScanner {
    pub fn new(api_key: String, store: SqliteStore) -> Result<Self, BanLookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key,
            store,
        })
    }

    pub async fn fetch(&self, steam_id: &str) -> Result<Option<BanRecord>, BanLookupError> {
        let response = self
            .client
            .get(GET_PLAYER_BANS_URL)
            .query(&[("key", self.api_key.as_str()), ("steamids", steam_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BanLookupError::Status(response.status()));
        }

        let body: PlayerBansResponse = response.json().await?;
        Ok(body.players.first().and_then(ban_record_from_json))
    }

    /// Look up one player and record a flagged ban state once per signature
    pub async fn scan(
        &self,
        target_id: i64,
        steam_id: &str,
        username: Option<&str>,
    ) -> Result<bool, BanLookupError> {
        let Some(ban) = self.fetch(steam_id).await? else {
            return Ok(false);
        };
        if !ban.is_flagged() {
            return Ok(false);
        }

        let store = self.store.clone();
        let owned_id = steam_id.to_string();
        let owned_name = username.map(str::to_string);
        let recorded_ban = ban.clone();
        let recorded = tokio::task::spawn_blocking(move || {
            store.record_ban_event(target_id, &owned_id, owned_name.as_deref(), &recorded_ban)
        })
        .await??;
        if recorded {
            log::info!(
                "🚫 Ban flags recorded for {} on target {} ({})",
                steam_id,
                target_id,
                ban.signature()
            );
        }
        Ok(recorded)
    }

    /// Fire-and-forget scan; failures only reach the debug log
    pub fn spawn_scan(&self, target_id: i64, steam_id: String, username: String) {
        let scanner = self.clone();
        tokio::spawn(async move {
            if let Err(e) = scanner.scan(target_id, &steam_id, Some(&username)).await {
                log::debug!("Ban lookup failed for {} (target {}): {}", steam_id, target_id, e);
            }
        });
    }
}
