//! fetchtext command-line interface.
//!
//! - `fetchtext serve` runs the HTTP service
//! - `fetchtext transform` runs a single batch from a file or stdin

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fetchtext::{BatchProcessor, DefaultExtractor, ServiceConfig, parse_records};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fetchtext", version, about = "Fetch record content sources and extract their text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Address to bind to
        #[arg(short = 'H', long, env = "FETCHTEXT_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "FETCHTEXT_PORT", default_value_t = 8000)]
        port: u16,

        /// Config file (defaults to a discovered fetchtext.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Transform one batch and print the resulting records as JSON
    Transform {
        /// Config file (defaults to a discovered fetchtext.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON file holding an object or an array of objects; stdin when omitted or "-"
        input: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fetchtext=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, config } => {
            let config = ServiceConfig::load(config.as_deref()).context("Failed to load configuration")?;
            fetchtext::api::serve(&host, port, config)
                .await
                .context("Server terminated with an error")?;
        }
        Commands::Transform { config, input, pretty } => {
            let config = ServiceConfig::load(config.as_deref()).context("Failed to load configuration")?;
            let payload = read_input(input.as_deref())?;
            let records = parse_records(&payload).context("Invalid input payload")?;

            let processor = BatchProcessor::new(&config, Arc::new(DefaultExtractor::new()))
                .context("Failed to initialize batch processor")?;
            let output = processor
                .run_batch(records)
                .await
                .context("Non-recoverable error while extracting content")?;

            let rendered = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read input from stdin")?;
            Ok(buf)
        }
    }
}
