//! Paced keeper run over a scenario

use anyhow::Result;
use colored::Colorize;
use lending_keeper::Keeper;
use std::path::Path;
use std::time::Duration;

use crate::config::load_scenario;
use crate::runner::{print_outcome, print_pass, print_snapshot, Simulation};

/// Replay a scenario one step per tick, running a keeper pass after each
pub async fn run_keeper(path: &Path, liquidator: String, pace_ms: u64) -> Result<()> {
    let scenario = load_scenario(path)?;
    let mut sim = Simulation::new(&scenario)?;
    let mut keeper = Keeper::new(liquidator.as_str().into());

    println!("{}", "=== Starting Keeper ===".bright_green().bold());
    println!("{} {}", "Scenario:".bright_cyan(), path.display());
    println!("{} {}", "Liquidator:".bright_cyan(), keeper.liquidator());
    println!("{} {}ms", "Pace:".bright_cyan(), pace_ms);

    let mut ticker = tokio::time::interval(Duration::from_millis(pace_ms.max(1)));
    for (index, step) in scenario.steps.iter().enumerate() {
        ticker.tick().await;
        println!(
            "\n{}",
            format!("[{}] Step {} at t={}", chrono::Local::now().format("%H:%M:%S%.3f"), index, step.at)
                .dimmed()
        );

        let outcome = sim.apply(index, step);
        print_outcome(&outcome);

        match keeper.run_pass(&mut sim.pool, step.at) {
            Ok(report) if report.candidates == 0 => {
                println!("  {} No liquidatable accounts found", "✓".green());
            }
            Ok(report) => print_pass(&report),
            Err(e) => {
                println!("  {} Pass skipped: {:#}", "ℹ".blue(), e);
            }
        }
    }

    print_snapshot(&sim.pool.pool_state()?);

    let stats = keeper.stats();
    println!("\n{}", "Keeper Statistics:".bright_yellow());
    println!("  {} {}", "Passes:".bright_cyan(), stats.passes);
    println!("  {} {}", "Total Liquidations:".bright_cyan(), stats.liquidations);
    println!("  {} {}", "Failed Attempts:".bright_cyan(), stats.failures);
    println!("  {} {}", "Collateral Seized:".bright_cyan(), stats.collateral_seized);
    println!("  {} {}", "Debt Repaid:".bright_cyan(), stats.debt_repaid);
    println!("  {} {}", "Bad Debt:".bright_cyan(), stats.bad_debt);

    if !sim.pool.check_invariants() {
        anyhow::bail!("Ledger invariants violated after keeper run");
    }
    Ok(())
}
