//! # forecast_sales
//!
//! Batch runner: forecasts monthly shop sales and writes the item forecast.

use clap::{Args, Parser, Subcommand};
use sales_forecast::data::{write_final_forecast, write_json, DataLoader};
use sales_forecast::pipeline::ForecastPipeline;
use sales_forecast::prep::{aggregate_monthly, prepare, PreparedData};
use sales_forecast::shares::ItemShareTable;
use sales_forecast::{ForecastConfig, ForecastError, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forecast_sales")]
#[command(about = "Monthly shop sales forecast with item disaggregation", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Daily transactions CSV
    #[arg(short, long, conflicts_with_all = ["matrix", "shares"])]
    transactions: Option<PathBuf>,

    /// Prepared training matrix CSV (`period,<shop_id>...`)
    #[arg(short, long, requires = "shares")]
    matrix: Option<PathBuf>,

    /// Prepared item share CSV
    #[arg(short, long, requires = "matrix")]
    shares: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every complete shop and write the item forecast
    Forecast {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Override the configured horizon
        #[arg(long)]
        horizon: Option<usize>,
    },

    /// Report train/test accuracy per shop without writing a forecast
    Backtest {
        #[command(flatten)]
        input: InputArgs,

        /// Override the configured training length
        #[arg(long)]
        train_length: Option<usize>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ForecastConfig> {
    match path {
        Some(path) => ForecastConfig::from_json_file(path),
        None => Ok(ForecastConfig::default()),
    }
}

fn load_input(input: &InputArgs, config: &ForecastConfig) -> Result<PreparedData> {
    match (&input.transactions, &input.matrix, &input.shares) {
        (Some(transactions), _, _) => {
            let transactions = DataLoader::transactions_from_csv(transactions)?;
            info!(rows = transactions.len(), "Loaded transactions");
            let monthly = aggregate_monthly(&transactions);
            prepare(&monthly, &config.prep, config.share_strategy)
        }
        (None, Some(matrix), Some(shares)) => {
            let matrix = DataLoader::training_matrix_from_csv(matrix)?;
            let shares = ItemShareTable::from_records(DataLoader::item_shares_from_csv(shares)?);
            Ok(PreparedData::from_parts(matrix, shares))
        }
        _ => Err(ForecastError::InvalidParameter(
            "Provide --transactions, or both --matrix and --shares".to_string(),
        )),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Forecast {
            input,
            output,
            horizon,
        } => {
            if let Some(horizon) = horizon {
                config.horizon = horizon;
            }
            let prepared = load_input(&input, &config)?;
            let run = ForecastPipeline::new(config).run(&prepared)?;

            let path = write_final_forecast(
                &output,
                &run.rows,
                run.report.generated_on,
                run.report.horizon,
            )?;
            write_json(path.with_extension("json"), &run.report)?;
            info!(path = %path.display(), rows = run.rows.len(), "Wrote forecast");
        }
        Commands::Backtest {
            input,
            train_length,
        } => {
            if let Some(train_length) = train_length {
                config.backtest_train_length = train_length;
            }
            let prepared = load_input(&input, &config)?;
            let reports = ForecastPipeline::new(config).backtest_matrix(&prepared.matrix)?;

            for (shop_id, report) in reports {
                match report {
                    Ok(report) => println!("Shop {}\n{}", shop_id, report),
                    Err(err) => println!("Shop {}: {}", shop_id, err),
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Forecast run failed");
            ExitCode::FAILURE
        }
    }
}
