//! Pool policy parameters
//!
//! `PoolConfig` is the serializable form front ends load from TOML;
//! `PoolParams` is the validated, fixed-point form the engine runs on.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::math::{Wad, BPS, SECONDS_PER_YEAR};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Simple annual borrow rate in basis points (1000 = 10%)
    pub annual_rate_bps: u64,

    /// Minimum collateral value / debt value in basis points (15000 = 1.5)
    pub collateral_ratio_bps: u64,

    /// Liquidator incentive in basis points of debt relief (0 = 1:1 value)
    pub liquidation_bonus_bps: u64,

    /// Length of one accrual interval
    pub accrual_interval_secs: u64,

    /// Accrual intervals per year (derived from the interval when absent)
    pub intervals_per_year: Option<u64>,

    /// Oldest oracle observation accepted
    pub max_price_age_secs: u64,

    /// Number of events retained in the journal
    pub event_log_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            annual_rate_bps: 1_000,
            collateral_ratio_bps: 15_000,
            liquidation_bonus_bps: 0,
            accrual_interval_secs: 60,
            intervals_per_year: None,
            max_price_age_secs: 300,
            event_log_capacity: 1_024,
        }
    }
}

impl PoolConfig {
    /// Check every field and produce engine parameters
    pub fn validate(&self) -> Result<PoolParams> {
        if self.collateral_ratio_bps as u128 <= BPS {
            return Err(LedgerError::InvalidConfig(format!(
                "collateral_ratio_bps must exceed {} (got {})",
                BPS, self.collateral_ratio_bps
            )));
        }
        if self.accrual_interval_secs == 0 {
            return Err(LedgerError::InvalidConfig(
                "accrual_interval_secs must be positive".to_string(),
            ));
        }
        let intervals_per_year = self
            .intervals_per_year
            .unwrap_or(SECONDS_PER_YEAR / self.accrual_interval_secs);
        if intervals_per_year == 0 {
            return Err(LedgerError::InvalidConfig(
                "intervals_per_year must be positive".to_string(),
            ));
        }
        if self.max_price_age_secs == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_price_age_secs must be positive".to_string(),
            ));
        }
        if self.liquidation_bonus_bps as u128 >= BPS {
            return Err(LedgerError::InvalidConfig(format!(
                "liquidation_bonus_bps must be below {} (got {})",
                BPS, self.liquidation_bonus_bps
            )));
        }
        if self.event_log_capacity == 0 {
            return Err(LedgerError::InvalidConfig(
                "event_log_capacity must be positive".to_string(),
            ));
        }

        Ok(PoolParams {
            annual_rate: Wad::from_bps(self.annual_rate_bps),
            collateral_ratio_threshold: Wad::from_bps(self.collateral_ratio_bps),
            liquidation_bonus_bps: self.liquidation_bonus_bps,
            min_interval: self.accrual_interval_secs,
            intervals_per_year,
            max_price_age: self.max_price_age_secs,
            event_log_capacity: self.event_log_capacity,
        })
    }
}

/// Validated policy constants (immutable for the life of a pool)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolParams {
    /// Annual rate applied per accrual interval
    pub annual_rate: Wad,
    pub collateral_ratio_threshold: Wad,
    pub liquidation_bonus_bps: u64,
    /// Seconds per accrual interval
    pub min_interval: u64,
    pub intervals_per_year: u64,
    /// Seconds
    pub max_price_age: u64,
    pub event_log_capacity: usize,
}
