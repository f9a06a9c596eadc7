//! Scenario execution against in-memory collaborators

use anyhow::{Context, Result};
use colored::Colorize;
use lending_keeper::{Keeper, PassReport};
use lending_ledger::sim::{InMemoryAssets, ManualPriceFeed};
use lending_ledger::{Asset, LendingPool, PoolSnapshot};
use serde::Serialize;
use std::path::Path;

use crate::config::{load_scenario, Action, Scenario, Step};

pub type SimPool = LendingPool<InMemoryAssets, ManualPriceFeed>;

/// Pool plus handles to its collaborators
pub struct Simulation {
    pub pool: SimPool,
    pub assets: InMemoryAssets,
    pub feed: ManualPriceFeed,
}

/// Result of one scenario step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub at: u64,
    pub op: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Simulation {
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let assets = InMemoryAssets::new();
        let feed = ManualPriceFeed::new();
        if let Some(price) = scenario.initial_price {
            feed.set(price, scenario.start);
        }
        for wallet in &scenario.wallets {
            assets.fund(&wallet.account, Asset::Base, u128::from(wallet.base));
            assets.fund(&wallet.account, Asset::Collateral, u128::from(wallet.collateral));
        }
        let pool = LendingPool::new(&scenario.pool, assets.clone(), feed.clone(), scenario.start)
            .context("Failed to create pool")?;
        Ok(Self { pool, assets, feed })
    }

    /// Publish the step's price, if any, then run its operation
    ///
    /// Ledger errors are part of the outcome, not a failure of the run.
    pub fn apply(&mut self, index: usize, step: &Step) -> StepOutcome {
        if let Some(price) = step.price {
            self.feed.set(price, step.at);
        }
        let now = step.at;
        let result = match &step.action {
            Action::Deposit { account, amount } => self
                .pool
                .deposit(account, u128::from(*amount), now)
                .map(|_| format!("{} posted {}", account, amount)),
            Action::Withdraw { account, amount } => self
                .pool
                .withdraw(account, u128::from(*amount), now)
                .map(|_| format!("{} withdrew {}", account, amount)),
            Action::Borrow { account, amount } => self
                .pool
                .borrow(account, u128::from(*amount), now)
                .map(|_| format!("{} borrowed {}", account, amount)),
            Action::Repay { account, amount } => self
                .pool
                .repay(account, u128::from(*amount), now)
                .map(|_| format!("{} repaid {}", account, amount)),
            Action::Mint { account, amount } => self
                .pool
                .mint(account, u128::from(*amount), now)
                .map(|shares| format!("{} minted {} shares for {}", account, shares, amount)),
            Action::Redeem { account, shares } => self
                .pool
                .redeem(account, u128::from(*shares), now)
                .map(|paid| format!("{} redeemed {} shares for {}", account, shares, paid)),
            Action::Liquidate {
                liquidator,
                account,
                amount,
            } => self
                .pool
                .liquidate(liquidator, account, u128::from(*amount), now)
                .map(|o| {
                    format!(
                        "{} seized {} from {} (repaid {}, bad debt {})",
                        liquidator, o.seized, account, o.debt_repaid, o.bad_debt
                    )
                }),
            Action::Tick => self.pool.tick(now).map(|s| {
                format!(
                    "{} intervals, index {}, price {}",
                    s.elapsed_intervals, s.accrual_index, s.collateral_price
                )
            }),
            Action::Fund {
                account,
                asset,
                amount,
            } => {
                self.assets.fund(account, *asset, u128::from(*amount));
                Ok(format!("{} funded with {} {}", account, amount, asset))
            }
        };

        let (ok, detail) = match result {
            Ok(detail) => (true, detail),
            Err(e) => (false, e.to_string()),
        };
        StepOutcome {
            index,
            at: step.at,
            op: step.action.name(),
            ok,
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    steps: &'a [StepOutcome],
    keeper_passes: &'a [PassReport],
    pool: PoolSnapshot,
    invariants_hold: bool,
}

pub fn run_scenario(path: &Path, json: bool, keeper: Option<String>) -> Result<()> {
    let scenario = load_scenario(path)?;
    let mut sim = Simulation::new(&scenario)?;
    let mut keeper = keeper.map(|id| Keeper::new(id.as_str().into()));

    if !json {
        println!("{}", "=== Running Scenario ===".bright_green().bold());
        println!("{} {}", "File:".bright_cyan(), path.display());
        println!("{} {}", "Steps:".bright_cyan(), scenario.steps.len());
        println!();
    }

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    let mut passes = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = sim.apply(index, step);
        if !json {
            print_outcome(&outcome);
        }
        outcomes.push(outcome);

        if let Some(keeper) = keeper.as_mut() {
            match keeper.run_pass(&mut sim.pool, step.at) {
                Ok(report) => {
                    if !json {
                        print_pass(&report);
                    }
                    passes.push(report);
                }
                Err(e) => {
                    log::warn!("keeper pass at {} skipped: {:#}", step.at, e);
                }
            }
        }
    }

    let snapshot = sim.pool.pool_state().context("Failed to read pool state")?;
    let invariants_hold = sim.pool.check_invariants();

    if json {
        let summary = RunSummary {
            steps: &outcomes,
            keeper_passes: &passes,
            pool: snapshot,
            invariants_hold,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_snapshot(&snapshot);
        if let Some(keeper) = keeper.as_ref() {
            let stats = keeper.stats();
            println!("\n{}", "Keeper:".bright_yellow());
            println!("  {} {}", "Passes:".bright_cyan(), stats.passes);
            println!("  {} {}", "Liquidations:".bright_cyan(), stats.liquidations);
            println!("  {} {}", "Failures:".bright_cyan(), stats.failures);
        }
        if invariants_hold {
            println!("\n{} Invariants hold", "✓".bright_green());
        }
    }

    if !invariants_hold {
        anyhow::bail!("Ledger invariants violated after scenario: {}", path.display());
    }
    Ok(())
}

pub fn print_outcome(outcome: &StepOutcome) {
    let mark = if outcome.ok {
        "✓".bright_green()
    } else {
        "✗".bright_red()
    };
    println!(
        "{} [{:>4}] t={} {:<9} {}",
        mark,
        outcome.index,
        outcome.at,
        outcome.op,
        if outcome.ok {
            outcome.detail.normal()
        } else {
            outcome.detail.yellow()
        }
    );
}

pub fn print_pass(report: &PassReport) {
    for record in &report.liquidated {
        println!(
            "  {} keeper liquidated {}: seized {}, repaid {}",
            "├─".dimmed(),
            record.account,
            record.outcome.seized,
            record.outcome.debt_repaid
        );
    }
    for failure in &report.failed {
        println!(
            "  {} keeper failed on {}: {}",
            "├─".dimmed(),
            failure.account,
            failure.error.yellow()
        );
    }
}

pub fn print_snapshot(snapshot: &PoolSnapshot) {
    println!("\n{}", "Pool State:".bright_yellow());
    println!("  {} {}", "Total Shares:".bright_cyan(), snapshot.total_shares);
    println!("  {} {}", "Total Borrowed:".bright_cyan(), snapshot.total_borrowed);
    println!("  {} {}", "Total Collateral:".bright_cyan(), snapshot.total_collateral);
    println!("  {} {}", "Pool Balance:".bright_cyan(), snapshot.pool_asset_balance);
    println!("  {} {}", "Exchange Rate:".bright_cyan(), snapshot.exchange_rate);
    println!("  {} {}", "Accrual Index:".bright_cyan(), snapshot.accrual_index);
    println!(
        "  {} {} (observed {})",
        "Collateral Price:".bright_cyan(),
        snapshot.collateral_price,
        snapshot.price_observed_at
    );
    println!("  {} {}", "Bad Debt:".bright_cyan(), snapshot.bad_debt);
    if snapshot.stranded_payments > 0 {
        println!("  {} {}", "Stranded Payments:".bright_red(), snapshot.stranded_payments);
    }
    println!("  {} {}", "Accounts:".bright_cyan(), snapshot.accounts);
}
