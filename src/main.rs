//! Scoreboard OCR - command line front end
//!
//! Reads recorded OCR detections and prints the reconstructed scoreboard as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scoreboard_ocr::config::{self, AppConfig};
use scoreboard_ocr::storage;
use scoreboard_ocr::vision::{JsonDetectionProvider, OcrProvider, ScoreboardParser};

/// Scoreboard OCR - rebuild game scoreboards from OCR output
#[derive(Parser, Debug)]
#[command(name = "scoreboard-ocr")]
#[command(about = "Reconstructs player names and stats from OCR text detections")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct the scoreboard from one or more detection files
    Parse {
        /// JSON files of recorded OCR detections
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print the bucketed grid of a detection file
    Grid {
        /// JSON file of recorded OCR detections
        input: PathBuf,
    },
    /// Write the default configuration
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::InitConfig { path } => init_config(path),
        Command::Parse { inputs } => {
            let config = load_or_default_config(args.config.as_deref())?;
            run_parse(config, &inputs)
        }
        Command::Grid { input } => {
            let config = load_or_default_config(args.config.as_deref())?;
            run_grid(config, &input)
        }
    }
}

/// Load configuration from the given path, the user config directory, or defaults
fn load_or_default_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_path) = storage::default_config_path() {
        if config_path.exists() {
            let config = config::load_config(&config_path)
                .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
            info!("Loaded configuration from {:?}", config_path);
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => storage::default_config_path()?,
    };

    config::save_config(&AppConfig::default(), &path)
        .with_context(|| format!("Failed to write configuration to {:?}", path))?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn run_parse(config: AppConfig, inputs: &[PathBuf]) -> Result<()> {
    let pretty = config.output.pretty;
    let parser = ScoreboardParser::with_config(config)?;
    let provider = JsonDetectionProvider::new();

    let mut failures = 0;
    for result in parser.parse_many(&provider, inputs) {
        match result.report {
            Ok(report) => print_json(&report, pretty)?,
            Err(e) => {
                error!("{:?}: {:#}", result.path, anyhow::Error::new(e));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} inputs could not be read", failures, inputs.len());
    }
    Ok(())
}

fn run_grid(config: AppConfig, input: &Path) -> Result<()> {
    let pretty = config.output.pretty;
    let parser = ScoreboardParser::with_config(config)?;

    let detections = JsonDetectionProvider::new().detect(input)?;
    let repo = parser.classify(&detections);
    print_json(&parser.grid_report(&repo), pretty)
}
