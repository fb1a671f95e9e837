use clap::Parser;
use football_trader::cli::{Cli, Commands};
use football_trader::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    football_trader::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Track(args) => {
            tracing::info!(store_dir = ?args.store_dir, "Tracking match odds");
            args.execute(&config).await?;
        }
        Commands::Analyze(args) => {
            tracing::info!(store_file = ?args.store_file, "Analyzing price trends");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("# Effective configuration ({})", cli.config);
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
