//! keiba-racecard main entry point
//!
//! This is the command-line interface for looking up a single race card.

use clap::Parser;
use keiba_racecard::config::{load_config, Config};
use keiba_racecard::render::{format_error, format_race_card, write_race_card, RenderOptions};
use keiba_racecard::RaceCardScraper;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// keiba-racecard: fetch a netkeiba race card
///
/// Tries a plain HTTP fetch first and falls back to a headless browser when
/// the entry table is missing or empty.
#[derive(Parser, Debug)]
#[command(name = "keiba-racecard")]
#[command(version)]
#[command(about = "Fetch a netkeiba race card", long_about = None)]
struct Cli {
    /// Race id, e.g. 202505030211 (year, venue, meeting, day, race)
    #[arg(value_name = "RACE_ID")]
    race_id: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the race card as JSON instead of a chat message
    #[arg(long)]
    json: bool,

    /// Never launch the headless browser
    #[arg(long)]
    static_only: bool,

    /// Maximum entrants listed in the chat message
    #[arg(long, default_value_t = 18)]
    max_entrants: usize,

    /// Also write the chat message to this file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    let scraper = RaceCardScraper::from_config(&config)?;

    let result = if cli.static_only {
        scraper.get_race_card_static(&cli.race_id).await
    } else {
        scraper.get_race_card(&cli.race_id).await
    };

    match result {
        Ok(card) => {
            let options = RenderOptions {
                max_entrants: cli.max_entrants,
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                print!("{}", format_race_card(&card, &options));
            }

            if let Some(path) = &cli.output {
                write_race_card(&card, &options, path)?;
                tracing::info!("Message written to: {}", path.display());
            }

            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprint!("{}", format_error(&cli.race_id, &e));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("keiba_racecard=info,warn"),
            1 => EnvFilter::new("keiba_racecard=debug,info"),
            2 => EnvFilter::new("keiba_racecard=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
