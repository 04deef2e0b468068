pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod filter;
pub mod names;
pub mod posts;
pub mod privacy;
pub mod ranking;
pub mod session;
pub mod votes;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use error::{AppError, AppResult};

use crate::{config::Config, feed::Feed};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub feed: Feed,
    pub config: Config,
}
