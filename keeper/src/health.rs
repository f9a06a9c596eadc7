//! Health calculation for borrower accounts

use lending_ledger::math::{mul_div_ceil, mul_div_floor};
use lending_ledger::{
    AccountId, AssetTransfer, CollateralRatio, LendingPool, PriceSource, Result, Wad, BPS, WAD,
};
use serde::Serialize;

/// Borrower position as seen by the keeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountHealth {
    pub account: AccountId,
    pub collateral: u128,
    pub debt: u128,
    pub ratio: CollateralRatio,
}

impl AccountHealth {
    pub fn is_liquidatable(&self, threshold: Wad) -> bool {
        self.debt > 0 && self.ratio.is_below(threshold)
    }
}

/// Health of every account carrying debt, in account order
///
/// Uses the pool's stored index and cached price; tick the pool first for
/// figures as of a given time.
pub fn assess<T: AssetTransfer, P: PriceSource>(
    pool: &LendingPool<T, P>,
) -> Result<Vec<AccountHealth>> {
    let mut out = Vec::new();
    for (id, account) in pool.accounts() {
        if !account.has_debt() {
            continue;
        }
        out.push(AccountHealth {
            account: id.clone(),
            collateral: account.collateral,
            debt: pool.current_debt(id)?,
            ratio: pool.ratio(id)?,
        });
    }
    Ok(out)
}

/// Liquidatable accounts, worst ratio first
pub fn scan<T: AssetTransfer, P: PriceSource>(
    pool: &LendingPool<T, P>,
) -> Result<Vec<AccountHealth>> {
    let threshold = pool.params().collateral_ratio_threshold;
    let mut unhealthy: Vec<AccountHealth> = assess(pool)?
        .into_iter()
        .filter(|h| h.is_liquidatable(threshold))
        .collect();
    unhealthy.sort_by(|a, b| a.ratio.cmp(&b.ratio).then_with(|| a.account.cmp(&b.account)));
    Ok(unhealthy)
}

/// Collateral to seize so the account is back at the threshold
///
/// Seizing `s` units lowers collateral value by `s * price` and debt by
/// `s * price * BPS / (BPS + bonus)`. Solving for the threshold gives
///
/// `s = (threshold * debt - collateral * price) / (price * (threshold * k - 1))`
///
/// with `k = BPS / (BPS + bonus)`, rounded up. When `threshold * k <= 1` a
/// partial seizure can never restore health and the full balance is returned.
/// Returns 0 for accounts already at or above the threshold.
pub fn plan_seize(
    collateral: u128,
    debt: u128,
    price: Wad,
    threshold: Wad,
    bonus_bps: u64,
) -> Result<u128> {
    if debt == 0 || collateral == 0 {
        return Ok(0);
    }
    let value = mul_div_floor(collateral, price.raw(), WAD)?;
    let required = mul_div_ceil(debt, threshold.raw(), WAD)?;
    if value >= required {
        return Ok(0);
    }
    let shortfall = required - value;

    let effective_threshold = mul_div_floor(threshold.raw(), BPS, BPS + bonus_bps as u128)?;
    if effective_threshold <= WAD {
        return Ok(collateral);
    }
    // Net ratio improvement per seized unit, in base asset (wad-scaled)
    let gain_per_unit = mul_div_floor(price.raw(), effective_threshold - WAD, WAD)?;
    if gain_per_unit == 0 {
        return Ok(collateral);
    }
    let seize = mul_div_ceil(shortfall, WAD, gain_per_unit)?;
    Ok(seize.min(collateral))
}
