//! Account linking through registration codes typed into in-game chat
//!
//! The chat front end issues a code like `SCUMBot-AB12CD-34EF56` and stores
//! it in `pending_links`. When that code shows up in a chat message, the
//! chatting player's identity is attached to the pending record.

use super::StoreError;
use crate::model::ChatMessage;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::LazyLock;

static REG_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SCUMBot-[A-Za-z0-9]{6}-[A-Za-z0-9]{6}").expect("registration pattern is valid")
});

/// Extract the first registration code from a chat message
pub fn find_code(message: &str) -> Option<&str> {
    REG_CODE_RE.find(message).map(|m| m.as_str())
}

/// Link the chatting player to a pending registration, if the message holds one
///
/// Returns `true` when a link was completed. Runs inside the chat batch
/// transaction.
pub(crate) fn link_from_chat(
    conn: &Connection,
    target_id: i64,
    chat: &ChatMessage,
) -> Result<bool, StoreError> {
    let Some(code) = find_code(&chat.message) else {
        return Ok(false);
    };
    if chat.actor.steam_id.is_empty() {
        return Ok(false);
    }

    let pending: Option<(String, bool)> = conn
        .query_row(
            "SELECT discord_id, linked FROM pending_links
             WHERE target_id = ?1 AND code = ?2 COLLATE NOCASE",
            params![target_id, code],
            |row| Ok((row.get(0)?, row.get::<_, i64>(1)? != 0)),
        )
        .optional()?;

    let Some((discord_id, linked)) = pending else {
        return Ok(false);
    };
    if linked {
        return Ok(false);
    }

    conn.execute(
        r#"
        INSERT INTO player_statistics (target_id, steam_id, discord_id, username, player_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(target_id, steam_id) DO UPDATE SET
            discord_id = excluded.discord_id,
            username = excluded.username,
            player_id = excluded.player_id
        "#,
        params![
            target_id,
            chat.actor.steam_id,
            discord_id,
            chat.actor.username,
            chat.actor.player_id,
        ],
    )?;

    conn.execute(
        "UPDATE login_logs SET username = ?1, player_id = ?2 WHERE target_id = ?3 AND steam_id = ?4",
        params![chat.actor.username, chat.actor.player_id, target_id, chat.actor.steam_id],
    )?;

    conn.execute(
        "UPDATE pending_links SET linked = 1 WHERE target_id = ?1 AND discord_id = ?2",
        params![target_id, discord_id],
    )?;

    log::info!(
        "🔗 Linked steam id {} to discord id {} (target {})",
        chat.actor.steam_id,
        discord_id,
        target_id
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_code_is_case_insensitive() {
        assert_eq!(find_code("link me scumbot-ab12cd-9ZXY01 pls"), Some("scumbot-ab12cd-9ZXY01"));
        assert_eq!(find_code("SCUMBot-ab12c-9zxy01"), None);
        assert_eq!(find_code("no code here"), None);
    }
}
