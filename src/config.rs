use std::{env, fmt::Display, str::FromStr};

use tracing::info;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Salt mixed into the truncated peer-address hash used in logs.
    pub ip_salt: String,
    /// Capacity of the feed broadcast channel; slow subscribers past this
    /// many buffered events start missing deltas and catch up on full fetch.
    pub feed_capacity: usize,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "8080"),
            database_url: try_load("DATABASE_URL", "sqlite://shadowboard.db?mode=rwc"),
            ip_salt: try_load("IP_SALT", "default-salt-change-this"),
            feed_capacity: try_load("FEED_CAPACITY", "256"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("invalid {key} value ({e}), using default: {default}");
            default
                .parse()
                .unwrap_or_else(|e| panic!("bad default for {key}: {e}"))
        }
    }
}
