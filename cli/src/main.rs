//! Lending ledger CLI - scenario runner and keeper simulator
//!
//! Drives an in-memory lending pool from TOML scenario files, optionally
//! with a liquidation keeper, and quotes individual positions offline.

use clap::{Parser, Subcommand};
use colored::Colorize;
use lending_ledger::Wad;
use std::path::PathBuf;

mod config;
mod keeper;
mod quote;
mod runner;

#[derive(Parser)]
#[command(name = "lending")]
#[command(about = "Lending ledger CLI - run scenarios and simulate keepers", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a scenario file against a fresh pool
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Emit a JSON summary instead of the step log
        #[arg(long)]
        json: bool,

        /// Run a keeper pass as this liquidator after every step
        #[arg(long)]
        keeper: Option<String>,
    },

    /// Replay a scenario at a fixed pace with a keeper attached
    Keeper {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Liquidator account the keeper acts as
        #[arg(short, long, default_value = "keeper")]
        liquidator: String,

        /// Milliseconds between steps
        #[arg(long, default_value = "250")]
        pace_ms: u64,
    },

    /// Validate a pool config file
    CheckConfig {
        /// Pool config file (TOML)
        path: PathBuf,
    },

    /// Quote a single position
    Quote {
        /// Collateral units
        #[arg(long)]
        collateral: u128,

        /// Collateral price in base units (decimal)
        #[arg(long)]
        price: Wad,

        /// Current debt in base units
        #[arg(long, default_value = "0")]
        debt: u128,

        /// Minimum collateral ratio (basis points)
        #[arg(long, default_value = "15000")]
        threshold_bps: u64,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match cli.command {
        Commands::Run { scenario, json, keeper } => {
            runner::run_scenario(&scenario, json, keeper)?;
        }
        Commands::Keeper { scenario, liquidator, pace_ms } => {
            keeper::run_keeper(&scenario, liquidator, pace_ms).await?;
        }
        Commands::CheckConfig { path } => {
            quote::check_config(&path)?;
        }
        Commands::Quote { collateral, price, debt, threshold_bps, json } => {
            let q = quote::quote(collateral, price, debt, threshold_bps)?;
            quote::print_quote(&q, json)?;
        }
    }

    if cli.verbose {
        println!("\n{}", "Done.".dimmed());
    }
    Ok(())
}
