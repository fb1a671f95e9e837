//! Configuration types for football-trader

use crate::exchange::{BetfairConfig, SessionCache, BETTING_API_URL, IDENTITY_URL};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Betfair endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Betting JSON-RPC endpoint
    #[serde(default = "default_betting_url")]
    pub betting_url: String,

    /// Certificate login endpoint
    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    /// Deadline for certificate login (seconds)
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,

    /// Timeout for each API request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_betting_url() -> String {
    BETTING_API_URL.to_string()
}
fn default_identity_url() -> String {
    IDENTITY_URL.to_string()
}
fn default_auth_timeout_secs() -> u64 {
    30
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            betting_url: BETTING_API_URL.to_string(),
            identity_url: IDENTITY_URL.to_string(),
            auth_timeout_secs: 30,
            request_timeout_secs: 30,
        }
    }
}

impl ExchangeConfig {
    /// Client configuration for the given application key
    pub fn betfair_config(&self, app_key: impl Into<String>) -> BetfairConfig {
        BetfairConfig {
            betting_url: self.betting_url.clone(),
            identity_url: self.identity_url.clone(),
            app_key: app_key.into(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            auth_timeout: Duration::from_secs(self.auth_timeout_secs),
        }
    }
}

/// Session cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cache directory, `~/.betfair` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Hours a freshly issued session is reused
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

fn default_expiry_hours() -> i64 {
    4
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: None,
            expiry_hours: 4,
        }
    }
}

impl SessionConfig {
    /// Session cache at the configured location
    pub fn cache(&self) -> SessionCache {
        let dir = self.dir.clone().unwrap_or_else(SessionCache::default_dir);
        SessionCache::new(dir, chrono::Duration::hours(self.expiry_hours))
    }
}

/// Hedge analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Back stake per trend
    #[serde(default = "default_stake", with = "rust_decimal::serde::float")]
    pub stake: Decimal,

    /// Exchange commission on winnings (e.g., 0.02 = 2%)
    #[serde(default = "default_commission", with = "rust_decimal::serde::float")]
    pub commission: Decimal,
}

fn default_stake() -> Decimal {
    Decimal::new(100, 0)
}
fn default_commission() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stake: Decimal::new(100, 0),
            commission: Decimal::new(2, 2),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
