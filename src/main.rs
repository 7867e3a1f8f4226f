//! streamfinder - where to watch a movie or show, per country
//!
//! Runs as an HTTP service or as a one-shot CLI lookup.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamfinder::commands::{ReplayCommand, SearchCommand, ServeCommand};
use streamfinder::config::{Config, OutputFormat};
use streamfinder::Country;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "streamfinder",
    version,
    about = "Find where a movie or show streams, per country",
    long_about = "Drives a headless Firefox through JustWatch search results and reports streaming, rental and purchase offers."
)]
struct Cli {
    /// Country whose offers are looked up (two-letter code)
    #[arg(long, global = true)]
    country: Option<Country>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /search/{item_name} over HTTP
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8000
        #[arg(long)]
        bind: Option<String>,
    },

    /// Look up a title once and print the offers
    #[command(alias = "s")]
    Search {
        /// Title to search for
        title: String,
    },

    /// Extract results from a saved search page without a browser
    Replay {
        /// Saved HTML of a search results page
        page: PathBuf,

        /// Title the page was searched for
        #[arg(long, default_value = "")]
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env is optional; loaded first so it can set RUST_LOG
    dotenvy::dotenv().ok();

    // Serving is long-running, so lifecycle messages are shown by default
    let floor = match cli.command {
        Commands::Serve { .. } => Level::INFO,
        _ => Level::WARN,
    };
    tracing_subscriber::fmt().with_env_filter(log_filter(cli.verbose, floor)).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(country) = cli.country {
        config.country = country;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if cli.headed {
        config.headless = false;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            ServeCommand::new(config).execute().await?;
        }

        Commands::Search { title } => {
            let output = SearchCommand::new(config).execute(&title).await?;
            println!("{}", output);
        }

        Commands::Replay { page, title } => {
            let output = ReplayCommand::new(config).execute(&page, &title).await?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn log_filter(verbose: bool, floor: Level) -> EnvFilter {
    if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(floor.into())
    }
}
