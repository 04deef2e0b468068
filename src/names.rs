//! Anonymous display-name pool.
//!
//! Availability is re-derived from the users table on every call rather
//! than cached, so the pool survives restarts and never drifts from the
//! authoritative assignment set. The scan-then-pick window still allows
//! two concurrent registrations to pick the same name; the UNIQUE index
//! on `users.anonymous_name` turns the loser into a retryable conflict.

use rand::seq::IndexedRandom;
use sqlx::SqlitePool;
use tracing::warn;

use crate::db;

const CURATED_NAMES: [&str; 25] = [
    "ShadowWalker", "MidnightVoice", "EchoWhisper", "DarkMuse", "VoidSpeaker",
    "NightThinker", "SilentStorm", "PhantomMind", "DuskPoet", "TwilightSage",
    "MysticVoice", "CrypticSoul", "EnigmaSpeak", "GhostWriter", "NebulaMind",
    "CosmicWhisper", "StardustVoice", "LunarPoet", "SolarMuse", "NovaSpeak",
    "ShadowScribe", "DarkOracle", "NightWhisper", "VoidEcho", "MysticPen",
];

const FALLBACK_PREFIX: &str = "Anonymous";

/// Pick an unused display name: a random free curated name, or the next
/// `Anonymous<n>` once the curated list is exhausted. If the availability
/// scan itself fails, degrade to a wall-clock suffix instead of failing
/// the registration.
pub async fn allocate(pool: &SqlitePool) -> String {
    match used_names(pool).await {
        Ok(used) => next_name(&used),
        Err(e) => {
            warn!("name availability scan failed ({e}), degrading to timestamp name");
            let millis = db::now_millis().to_string();
            let suffix = &millis[millis.len().saturating_sub(4)..];
            format!("{FALLBACK_PREFIX}{suffix}")
        }
    }
}

/// Unassign `name` from whoever holds it; the next allocation scan will
/// see it as free again. Generic over the executor so callers can run it
/// inside a transaction alongside the account delete.
pub async fn release<'e, E>(executor: E, name: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query("UPDATE users SET anonymous_name = NULL WHERE anonymous_name = ?")
        .bind(name)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn is_available(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let held: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM users WHERE anonymous_name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(held.is_none())
}

async fn used_names(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT anonymous_name FROM users WHERE anonymous_name IS NOT NULL")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}

fn next_name(used: &[String]) -> String {
    let free: Vec<&str> = CURATED_NAMES
        .iter()
        .copied()
        .filter(|name| !used.iter().any(|u| u == name))
        .collect();

    if let Some(name) = free.choose(&mut rand::rng()) {
        return (*name).to_string();
    }

    // Curated list exhausted: numbers only ever grow, so the next value is
    // strictly greater than every Anonymous<n> currently assigned.
    let max = used
        .iter()
        .filter_map(|name| fallback_number(name))
        .max()
        .unwrap_or(0);
    format!("{FALLBACK_PREFIX}{}", max + 1)
}

fn fallback_number(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(FALLBACK_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
