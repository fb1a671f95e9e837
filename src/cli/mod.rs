//! CLI interface for football-trader
//!
//! Provides subcommands for:
//! - `track`: Record current match odds for the queried leagues
//! - `analyze`: Report hedge profit and loss from recorded prices
//! - `config`: Show effective configuration

mod analyze;
mod track;

pub use analyze::{render, AnalyzeArgs, ReportFormat};
pub use track::{sync_with_reauth, TrackArgs, STORE_FILE};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "football-trader")]
#[command(about = "Betfair football match odds tracker and hedge analyzer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record current match odds for the queried leagues
    Track(TrackArgs),
    /// Report hedge profit and loss from recorded prices
    Analyze(AnalyzeArgs),
    /// Show effective configuration
    Config,
}
