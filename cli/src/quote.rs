//! Offline position quotes and config checks

use anyhow::{Context, Result};
use colored::Colorize;
use lending_keeper::plan_seize;
use lending_ledger::math::{mul_div_floor, SECONDS_PER_YEAR};
use lending_ledger::{CollateralRatio, PoolConfig, Wad, WAD};
use serde::Serialize;
use std::path::Path;

use crate::config::load_pool_config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub collateral_value: u128,
    pub ratio: CollateralRatio,
    pub healthy: bool,
    /// Further borrowing allowed before hitting the threshold
    pub max_additional_borrow: u128,
    /// Collateral a keeper would seize right now
    pub suggested_seize: u128,
}

pub fn quote(collateral: u128, price: Wad, debt: u128, threshold_bps: u64) -> Result<Quote> {
    let threshold = Wad::from_bps(threshold_bps);
    let value = mul_div_floor(collateral, price.raw(), WAD).context("collateral value overflows")?;
    let ratio = if debt == 0 {
        CollateralRatio::Infinite
    } else {
        CollateralRatio::Finite(Wad(
            mul_div_floor(collateral, price.raw(), debt).context("ratio overflows")?,
        ))
    };
    let capacity = if threshold.is_zero() {
        u128::MAX
    } else {
        mul_div_floor(value, WAD, threshold.raw()).context("borrow capacity overflows")?
    };
    let suggested_seize = plan_seize(collateral, debt, price, threshold, 0)?;

    Ok(Quote {
        collateral_value: value,
        ratio,
        healthy: !ratio.is_below(threshold),
        max_additional_borrow: capacity.saturating_sub(debt),
        suggested_seize,
    })
}

pub fn print_quote(q: &Quote, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(q)?);
        return Ok(());
    }
    println!("{}", "=== Position Quote ===".bright_green().bold());
    println!("{} {}", "Collateral Value:".bright_cyan(), q.collateral_value);
    println!("{} {}", "Ratio:".bright_cyan(), q.ratio);
    if q.healthy {
        println!("{} {}", "Status:".bright_cyan(), "healthy".bright_green());
    } else {
        println!("{} {}", "Status:".bright_cyan(), "liquidatable".bright_red());
        println!("{} {}", "Suggested Seize:".bright_cyan(), q.suggested_seize);
    }
    println!("{} {}", "Can Borrow:".bright_cyan(), q.max_additional_borrow);
    Ok(())
}

/// Validate a pool config file and print the derived parameters
pub fn check_config(path: &Path) -> Result<()> {
    let config: PoolConfig = load_pool_config(path)?;
    let params = config
        .validate()
        .with_context(|| format!("Invalid pool config: {}", path.display()))?;

    println!("{}", "=== Pool Config ===".bright_green().bold());
    println!("{} {}", "File:".bright_cyan(), path.display());
    println!("{} {}", "Annual Rate:".bright_cyan(), params.annual_rate);
    println!("{} {}", "Collateral Threshold:".bright_cyan(), params.collateral_ratio_threshold);
    println!("{} {} bps", "Liquidation Bonus:".bright_cyan(), params.liquidation_bonus_bps);
    println!("{} {}s", "Accrual Interval:".bright_cyan(), params.min_interval);
    println!("{} {}", "Intervals / Year:".bright_cyan(), params.intervals_per_year);
    println!("{} {}s", "Max Price Age:".bright_cyan(), params.max_price_age);
    println!("{} {}", "Event Log Capacity:".bright_cyan(), params.event_log_capacity);

    if params.intervals_per_year.checked_mul(params.min_interval) != Some(SECONDS_PER_YEAR) {
        println!(
            "  {} intervals_per_year does not tile a {}s year; nominal rate differs from annual",
            "⚠".yellow(),
            SECONDS_PER_YEAR
        );
    }
    println!("\n{} Config is valid", "✓".bright_green());
    Ok(())
}
