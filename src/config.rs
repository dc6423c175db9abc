use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://lichess.org";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub poll_interval: Duration,
    pub broadcast_nb: usize,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(60),
            broadcast_nb: 10,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Reads settings from the process environment. Call `load_dotenv` first
    /// so `.env` files are visible here.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("LICHESS_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let poll_secs = lookup("TOURNAMENT_POLL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(60)
            .max(10);
        let broadcast_nb = lookup("BROADCAST_NB")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(10)
            .clamp(1, 50);
        let timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(10)
            .clamp(1, 120);

        Self {
            base_url,
            poll_interval: Duration::from_secs(poll_secs),
            broadcast_nb,
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
