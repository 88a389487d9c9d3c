//! Stockcast CLI - next-day close prediction from daily bars
//!
//! # Usage
//! ```sh
//! stockcast --data-dir data predict AAPL --period 2y
//! stockcast --data-dir data info AAPL
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.
//!
//! # Environment Variables
//! - `STOCKCAST_CV_FOLDS`, `STOCKCAST_SEED`, `STOCKCAST_MAX_WORKERS`, `STOCKCAST_TOP_FEATURES`
//! - `RUST_LOG` - log filter (default: info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockcast::PredictorConfig;
use stockcast::StockPredictor;
use stockcast::domain::market::lookback::LookbackPeriod;
use stockcast::infrastructure::CsvBarProvider;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding one <SYMBOL>.csv file per symbol
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Optional TOML predictor configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on the lookback window and predict the next close
    Predict {
        symbol: String,
        /// Lookback period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 3y, 5y, 10y, ytd, max
        #[arg(long, default_value = "2y")]
        period: LookbackPeriod,
    },
    /// Train on the lookback window and print model scores and top features
    Info {
        symbol: String,
        #[arg(long, default_value = "2y")]
        period: LookbackPeriod,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PredictorConfig> {
    match path {
        Some(path) => PredictorConfig::from_file(path)?
            .with_overrides(|key| std::env::var(key).ok())
            .context("Invalid environment overrides"),
        None => PredictorConfig::from_env(),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let provider = CsvBarProvider::new(&cli.data_dir);
    info!("Stockcast {} reading bars from {}", env!("CARGO_PKG_VERSION"), cli.data_dir.display());

    match cli.command {
        Command::Predict { symbol, period } => {
            let mut predictor = StockPredictor::new(&symbol, config);
            let result = predictor.train_and_predict(&provider, period)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Info { symbol, period } => {
            let mut predictor = StockPredictor::new(&symbol, config);
            predictor.train_and_predict(&provider, period)?;
            println!("{}", serde_json::to_string_pretty(&predictor.model_info())?);
        }
    }

    Ok(())
}
