//! Shipped configuration

use football_trader::config::{AnalysisConfig, Config};
use football_trader::exchange::{BETTING_API_URL, IDENTITY_URL};
use football_trader::telemetry::LogFormat;

#[test]
fn test_config_example_matches_defaults() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.exchange.betting_url, BETTING_API_URL);
    assert_eq!(config.exchange.identity_url, IDENTITY_URL);
    assert_eq!(config.session.expiry_hours, 4);
    assert!(config.session.dir.is_none());
    assert_eq!(config.analysis, AnalysisConfig::default());
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
}
