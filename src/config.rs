use dotenvy::dotenv;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    /// Poll interval for the trusted tip leaderboard, in seconds.
    pub leaderboard_poll_secs: u64,
    /// Maximum chat rows replayed to a late joiner.
    pub chat_history_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8086);
        let leaderboard_poll_secs = env::var("LEADERBOARD_POLL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let chat_history_limit = env::var("CHAT_HISTORY_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        Ok(Self {
            database_url,
            redis_url,
            port,
            leaderboard_poll_secs,
            chat_history_limit,
        })
    }
}
