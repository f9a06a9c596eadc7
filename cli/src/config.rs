//! Scenario and pool configuration files

use anyhow::{Context, Result};
use lending_ledger::{AccountId, Asset, PoolConfig, Wad};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A scripted run against an in-memory pool
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Pool creation time
    #[serde(default = "default_start")]
    pub start: u64,

    /// Price published at `start`, if any
    #[serde(default)]
    pub initial_price: Option<Wad>,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub wallets: Vec<Wallet>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_start() -> u64 {
    1
}

/// Opening external balances for one account
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wallet {
    pub account: AccountId,
    #[serde(default)]
    pub base: u64,
    #[serde(default)]
    pub collateral: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Operation timestamp
    pub at: u64,

    /// Price published (observed at `at`) before the operation runs
    #[serde(default)]
    pub price: Option<Wad>,

    #[serde(flatten)]
    pub action: Action,
}

/// Scenario operation
///
/// Amounts are `u64` in files: TOML integers are 64-bit and serde cannot
/// buffer 128-bit integers through the internally tagged representation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Deposit { account: AccountId, amount: u64 },
    Withdraw { account: AccountId, amount: u64 },
    Borrow { account: AccountId, amount: u64 },
    Repay { account: AccountId, amount: u64 },
    Mint { account: AccountId, amount: u64 },
    Redeem { account: AccountId, shares: u64 },
    Liquidate {
        liquidator: AccountId,
        account: AccountId,
        amount: u64,
    },
    Tick,
    /// Top up an external wallet mid-run
    Fund {
        account: AccountId,
        asset: Asset,
        amount: u64,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Deposit { .. } => "deposit",
            Action::Withdraw { .. } => "withdraw",
            Action::Borrow { .. } => "borrow",
            Action::Repay { .. } => "repay",
            Action::Mint { .. } => "mint",
            Action::Redeem { .. } => "redeem",
            Action::Liquidate { .. } => "liquidate",
            Action::Tick => "tick",
            Action::Fund { .. } => "fund",
        }
    }
}

/// Load and parse a scenario file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
    let scenario: Scenario = toml::from_str(&data)
        .with_context(|| format!("Failed to parse scenario: {}", path.display()))?;
    scenario
        .pool
        .validate()
        .with_context(|| format!("Invalid pool section in: {}", path.display()))?;
    Ok(scenario)
}

/// Load a bare pool configuration file
pub fn load_pool_config(path: &Path) -> Result<PoolConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool config: {}", path.display()))?;
    toml::from_str(&data).with_context(|| format!("Failed to parse pool config: {}", path.display()))
}
