//! Analyze command implementation

use crate::analysis::{extract_trends, PnlReport};
use crate::config::Config;
use crate::store::Store;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Store file written by `track`
    #[arg(long, default_value = "store.json")]
    pub store_file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let report = self.build_report(config);
        println!("{}", render(&report, self.format)?);
        Ok(())
    }

    fn build_report(&self, config: &Config) -> PnlReport {
        let store = Store::load(&self.store_file);
        let trends = extract_trends(&store);

        tracing::info!(
            fixtures = store.fixture_count(),
            trends = trends.len(),
            "Trends extracted"
        );

        PnlReport::build(&trends, &config.analysis)
    }
}

/// Render the report in the requested format
pub fn render(report: &PnlReport, format: ReportFormat) -> anyhow::Result<String> {
    match format {
        ReportFormat::Table => Ok(report.format_table()),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}
