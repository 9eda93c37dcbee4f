//! Environment-based configuration.
//!
//! All settings come from the process environment (plus a `.env` file loaded
//! at startup). The [`EnvConfig`] extension trait turns any `Deserialize`
//! struct into an env-backed config; [`Config`] is the application's own
//! settings block. SMTP settings live next to the mailer in
//! [`crate::mail::SmtpConfig`] and are loaded the same way.

use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use config::ConfigError;

pub trait EnvConfig: Sized {
    fn from_env() -> Result<Self, ConfigError>;
    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError>;
}

impl<D> EnvConfig for D
where
    D: DeserializeOwned,
{
    fn from_env() -> Result<Self, ConfigError> {
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .expect("basic config builder");
        c.try_deserialize()
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let c = config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()
            .expect("basic config builder");
        c.try_deserialize()
    }
}

/// Application settings.
///
/// | Variable | Required | Description |
/// |----------|----------|-------------|
/// | `DATABASE_URL` | Yes | Postgres connection string |
/// | `HMAC_KEY` | Yes | JWT signing secret (min 32 bytes) |
/// | `PORT` | No | HTTP port (default: 8000) |
/// | `TOKEN_TTL_HOURS` | No | JWT lifetime (default: 336 = 2 weeks) |
/// | `COOKIE_SECURE` | No | Mark the session cookie `Secure` (default: true) |
/// | `SCHEDULER_ENABLED` | No | Run the in-process mailing scheduler under `serve` (default: true) |
/// | `MAILING_CRON` | No | Tick schedule for the mailing job (default: every minute) |
/// | `CACHE_ENABLED` | No | Cache dashboard stats (default: true) |
/// | `CACHE_TTL_SECS` | No | Dashboard cache lifetime (default: 60) |
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub hmac_key: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_true")]
    pub cookie_secure: bool,

    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,

    #[serde(default = "default_mailing_cron")]
    pub mailing_cron: String,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_port() -> u16 {
    8000
}

fn default_token_ttl_hours() -> i64 {
    // two weeks
    14 * 24
}

fn default_true() -> bool {
    true
}

fn default_mailing_cron() -> String {
    // sec min hour day-of-month month day-of-week
    "0 * * * * *".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}
