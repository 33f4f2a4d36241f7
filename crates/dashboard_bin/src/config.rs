use dotenvy::dotenv;
use history_cache::DEFAULT_TTL_MINUTES;
use std::env;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not a valid number: '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("DASHBOARD_CACHE_TTL_MINUTES must be positive")]
    NonPositiveTtl,
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub workers: usize,
    pub bind: String,
    pub coingecko_url: String,
    pub cache_ttl_minutes: i64,
}

impl Config {
    pub fn new() -> Result<Config, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or blank values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut workers: usize = match value("DASHBOARD_WORKERS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                key: "DASHBOARD_WORKERS",
                value: raw,
            })?,
            None => 1,
        };
        if workers == 0 {
            workers = 1;
        }

        let cache_ttl_minutes: i64 = match value("DASHBOARD_CACHE_TTL_MINUTES") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                key: "DASHBOARD_CACHE_TTL_MINUTES",
                value: raw,
            })?,
            None => DEFAULT_TTL_MINUTES,
        };
        if cache_ttl_minutes <= 0 {
            return Err(ConfigError::NonPositiveTtl);
        }

        let bind = value("DASHBOARD_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let coingecko_url =
            value("DASHBOARD_COINGECKO_URL").unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string());

        Ok(Config {
            workers,
            bind,
            coingecko_url,
            cache_ttl_minutes,
        })
    }
}
