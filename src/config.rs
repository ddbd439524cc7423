//! Runtime configuration.
//!
//! All settings are gathered into one [`AppConfig`] that is handed to the feed
//! client and the store at construction time, so tests can point either one
//! somewhere else without touching process-wide state.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_STORE_PATH: &str = "data/market_data.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

const ENV_API_KEY: &str = "ALPHAVANTAGE_API_KEY";
const ENV_BASE_URL: &str = "ALPHAVANTAGE_BASE_URL";
const ENV_STORE_PATH: &str = "MARKET_STORE_PATH";
const ENV_HISTORY_START: &str = "MARKET_HISTORY_START";
const ENV_TIMEOUT: &str = "MARKET_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Alpha Vantage key. Only pulls need it; analytics run without one.
    pub api_key: Option<String>,
    pub base_url: String,
    pub store_path: PathBuf,
    /// Inclusive lower bound for historical pulls.
    pub history_start: NaiveDate,
    pub timeout: Duration,
    /// Trailing-average window, in calendar days.
    pub window_days: u32,
}

impl AppConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::for_store(DEFAULT_STORE_PATH);

        config.api_key = lookup(ENV_API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|v| !v.trim().is_empty()) {
            config.store_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = lookup(ENV_HISTORY_START) {
            config.history_start = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                AppError::Config(format!("{ENV_HISTORY_START}='{raw}' is not a YYYY-MM-DD date: {e}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                AppError::Config(format!("{ENV_TIMEOUT}='{raw}' is not a whole number of seconds: {e}"))
            })?;
            if secs == 0 {
                return Err(AppError::Config(format!("{ENV_TIMEOUT} must be at least 1 second")));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Offline config rooted at an explicit store path.
    pub fn for_store(path: impl Into<PathBuf>) -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            store_path: path.into(),
            history_start: default_history_start(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Config(format!("Missing {ENV_API_KEY} in environment (.env)."))
        })
    }
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or(NaiveDate::MIN)
}
