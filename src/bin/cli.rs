//! Crossword roundup CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use xword_roundup::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, Runner},
    services,
};

/// roundup - daily crossword collector
#[derive(Parser, Debug)]
#[command(
    name = "roundup",
    version,
    about = "Collects the day's crossword puzzles from a roster of sources"
)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "roundup.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every source and write the day's digest
    Run {
        /// Day to run for (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Check a single source and print its records
    Check {
        /// Source name as configured
        name: String,

        /// Day to check for (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Look for a puzzle on one page and save it
    Scrape {
        /// Page URL
        url: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| AppError::validation(format!("Invalid date '{s}': {e}"))),
        None => Ok(Local::now().date_naive()),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { date } => {
            config.validate()?;
            let today = parse_date(date.as_deref())?;
            let ctx = pipeline::build_context(&config, today)?;

            let published = pipeline::run_daily(ctx, &config, today).await?;

            log::info!("Digest written to {}", published.page.display());
            if let Some(archive) = &published.archive {
                log::info!("Archive written to {}", archive.display());
            }
            println!("{}\n\n{}", published.subject, published.message);
        }

        Command::Check { name, date } => {
            let today = parse_date(date.as_deref())?;
            let source = config
                .source(&name)
                .ok_or_else(|| AppError::config(format!("No source named '{name}'")))?;
            let ctx = pipeline::build_context(&config, today)?;

            let records = Runner::new(ctx, &config).check_source(source, today).await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Scrape { url } => {
            let today = Local::now().date_naive();
            let ctx = pipeline::build_context(&config, today)?;

            match services::scrape_page(&ctx, &url).await? {
                Some(path) => log::info!("Saved {}", path.display()),
                None => log::warn!("No puzzle found at {url}"),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} sources)", config.sources.len());
        }
    }

    log::info!("Done!");

    Ok(())
}
