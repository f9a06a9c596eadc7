//! Liquidation keeper for the lending ledger
//!
//! A keeper pass brings the pool's accrual index and price current, scans
//! every borrower, and liquidates the unhealthy ones worst-first, seizing
//! just enough collateral to restore the threshold.

pub mod health;

use anyhow::{Context, Result};
use lending_ledger::{AccountId, AssetTransfer, LendingPool, LiquidationOutcome, PriceSource};
use serde::Serialize;

pub use health::{assess, plan_seize, scan, AccountHealth};

/// One liquidation executed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidationRecord {
    pub account: AccountId,
    pub outcome: LiquidationOutcome,
}

/// One liquidation attempt that the pool rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub account: AccountId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub at: u64,
    /// Accounts found below the threshold
    pub candidates: usize,
    pub liquidated: Vec<LiquidationRecord>,
    pub failed: Vec<FailureRecord>,
}

/// Cumulative totals across passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeeperStats {
    pub passes: u64,
    pub liquidations: u64,
    pub failures: u64,
    pub collateral_seized: u128,
    pub debt_repaid: u128,
    pub bad_debt: u128,
}

pub struct Keeper {
    liquidator: AccountId,
    stats: KeeperStats,
}

impl Keeper {
    pub fn new(liquidator: AccountId) -> Self {
        Self {
            liquidator,
            stats: KeeperStats::default(),
        }
    }

    pub fn liquidator(&self) -> &AccountId {
        &self.liquidator
    }

    pub fn stats(&self) -> KeeperStats {
        self.stats
    }

    /// Run one scan-and-liquidate pass at time `now`
    ///
    /// Fails only if the pool cannot be brought current (e.g. stale price).
    /// Individual liquidation failures are recorded in the report and the
    /// pass moves on to the next account.
    pub fn run_pass<T: AssetTransfer, P: PriceSource>(
        &mut self,
        pool: &mut LendingPool<T, P>,
        now: u64,
    ) -> Result<PassReport> {
        pool.tick(now).context("keeper: failed to bring pool current")?;

        let candidates = scan(pool).context("keeper: health scan failed")?;
        let threshold = pool.params().collateral_ratio_threshold;
        let bonus_bps = pool.params().liquidation_bonus_bps;
        let price = pool.state().collateral_price;

        let mut report = PassReport {
            at: now,
            candidates: candidates.len(),
            ..PassReport::default()
        };

        for health in candidates {
            let planned = plan_seize(health.collateral, health.debt, price, threshold, bonus_bps);
            let result = planned.and_then(|seize| {
                log::debug!(
                    "keeper: {} at ratio {}, seizing {} of {}",
                    health.account,
                    health.ratio,
                    seize,
                    health.collateral
                );
                pool.liquidate(&self.liquidator, &health.account, seize, now)
            });
            match result {
                Ok(outcome) => {
                    self.stats.liquidations += 1;
                    self.stats.collateral_seized += outcome.seized;
                    self.stats.debt_repaid += outcome.debt_repaid;
                    self.stats.bad_debt += outcome.bad_debt;
                    report.liquidated.push(LiquidationRecord {
                        account: health.account,
                        outcome,
                    });
                }
                Err(e) => {
                    log::warn!("keeper: liquidation of {} failed: {}", health.account, e);
                    self.stats.failures += 1;
                    report.failed.push(FailureRecord {
                        account: health.account,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.stats.passes += 1;
        log::info!(
            "keeper: pass at {} liquidated {} of {} candidates",
            now,
            report.liquidated.len(),
            report.candidates
        );
        Ok(report)
    }
}
