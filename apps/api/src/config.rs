use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means bookmarks are kept in memory only.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub adzuna: Option<AdzunaCredentials>,
    pub jooble_api_key: Option<String>,
    pub results_per_page: u32,
    pub provider_timeout: Duration,
    pub signup_url: String,
    pub enrichment_preload: bool,
    /// Job boards unused for this long are dropped.
    pub session_idle_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct AdzunaCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let adzuna = match (optional_env("ADZUNA_APP_ID"), optional_env("ADZUNA_APP_KEY")) {
            (Some(app_id), Some(app_key)) => Some(AdzunaCredentials { app_id, app_key }),
            _ => None,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            adzuna,
            jooble_api_key: optional_env("JOOBLE_API_KEY"),
            results_per_page: parse_env("RESULTS_PER_PAGE", 100)?,
            provider_timeout: Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 20)?),
            signup_url: optional_env("SIGNUP_URL").unwrap_or_else(|| "/CreatorSignup".to_string()),
            enrichment_preload: parse_env("ENRICHMENT_PRELOAD", false)?,
            session_idle_ttl: Duration::from_secs(parse_env("SESSION_IDLE_TTL_SECS", 1800)?),
            session_sweep_interval: Duration::from_secs(parse_env::<u64>("SESSION_SWEEP_SECS", 60)?.max(1)),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
