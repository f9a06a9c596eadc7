//! Interest accrual
//!
//! Interest is tracked with a single global index (O(1) per accrual, like a
//! cumulative funding index). Each borrower stores the index at their last
//! debt update; their current debt is `principal * index / checkpoint`.
//!
//! The pool total is never grown on its own. It is recomputed from the sum
//! of normalized debts, so it cannot drift away from the accounts it covers.
//!
//! Accrual only happens in whole intervals. Every mutating operation stages
//! an [`AccrualStep`] first and commits it together with its own changes.

use serde::Serialize;

use crate::config::PoolParams;
use crate::error::Result;
use crate::events::LedgerEvent;
use crate::math::{mul_div_floor, Wad};
use crate::oracle::{PriceObservation, PriceSource};
use crate::pool::{borrowed_at, LendingPool};
use crate::transfer::AssetTransfer;

/// Accrual and price refresh computed for one operation, not yet applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccrualStep {
    /// Operation timestamp
    pub now: u64,

    /// Whole intervals elapsed since the last accrual (0 = no accrual)
    pub elapsed_intervals: u64,

    pub growth: Wad,
    pub accrual_index: Wad,
    pub total_borrowed: u128,

    /// `last_accrual_time` after the step
    pub last_accrual_time: u64,

    /// Price in effect for the operation
    pub collateral_price: Wad,
    pub price_observed_at: u64,

    /// True if the price was fetched from the oracle during this step
    pub price_refreshed: bool,
}

impl AccrualStep {
    pub fn accrued(&self) -> bool {
        self.elapsed_intervals > 0
    }
}

/// Growth factor for `elapsed_intervals` of simple interest
///
/// `1 + annual_rate * elapsed / intervals_per_year`, rounded down.
pub fn growth_factor(params: &PoolParams, elapsed_intervals: u64) -> Result<Wad> {
    let increment = mul_div_floor(
        params.annual_rate.raw(),
        elapsed_intervals as u128,
        params.intervals_per_year as u128,
    )?;
    Wad::ONE.checked_add(Wad(increment))
}

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Compute the accrual step for `now` without touching state
    ///
    /// The oracle is consulted when an accrual is due, or when the cached
    /// price is absent or stale. Otherwise the cached price is reused.
    ///
    /// # Errors
    /// * `StalePrice` if a refresh was required and the oracle had no fresh price
    /// * `Overflow` if the index or aggregate debt no longer fit
    pub(crate) fn stage_accrual(&self, now: u64) -> Result<AccrualStep> {
        let last = self.state.last_accrual_time;
        // Clock running backwards is treated as no time elapsed
        let elapsed_intervals = now.saturating_sub(last) / self.params.min_interval;

        if elapsed_intervals == 0 {
            let (observation, refreshed) =
                if self.oracle.is_stale(self.state.price_observed_at, now) {
                    (self.oracle.fetch_price(now)?, true)
                } else {
                    (self.cached_price(), false)
                };
            return Ok(AccrualStep {
                now,
                elapsed_intervals: 0,
                growth: Wad::ONE,
                accrual_index: self.state.accrual_index,
                total_borrowed: self.state.total_borrowed,
                last_accrual_time: last,
                collateral_price: observation.price,
                price_observed_at: observation.observed_at,
                price_refreshed: refreshed,
            });
        }

        let growth = growth_factor(&self.params, elapsed_intervals)?;
        let accrual_index = self.state.accrual_index.mul(growth)?;
        let total_borrowed = borrowed_at(self.state.normalized_debt, accrual_index)?;
        let observation = self.oracle.fetch_price(now)?;

        Ok(AccrualStep {
            now,
            elapsed_intervals,
            growth,
            accrual_index,
            total_borrowed,
            last_accrual_time: now,
            collateral_price: observation.price,
            price_observed_at: observation.observed_at,
            price_refreshed: true,
        })
    }

    /// Write a staged step into pool state
    ///
    /// Callers commit the step before writing their own staged totals, which
    /// were valued at the step's `accrual_index`.
    pub(crate) fn commit_accrual(&mut self, step: &AccrualStep) {
        if step.accrued() {
            self.state.accrual_index = step.accrual_index;
            self.state.total_borrowed = step.total_borrowed;
            self.state.last_accrual_time = step.last_accrual_time;
            self.state.accrual_count += 1;
            log::debug!(
                "accrual: {} intervals, growth {}, index {}, total borrowed {}",
                step.elapsed_intervals,
                step.growth,
                step.accrual_index,
                step.total_borrowed
            );
            self.record(LedgerEvent::Accrued {
                at: step.now,
                elapsed_intervals: step.elapsed_intervals,
                growth: step.growth,
                accrual_index: step.accrual_index,
                total_borrowed: step.total_borrowed,
            });
        }
        if step.price_refreshed {
            self.state.collateral_price = step.collateral_price;
            self.state.price_observed_at = step.price_observed_at;
            log::debug!(
                "accrual: price refreshed to {} (observed at {})",
                step.collateral_price,
                step.price_observed_at
            );
            self.record(LedgerEvent::PriceRefreshed {
                at: step.now,
                price: step.collateral_price,
                observed_at: step.price_observed_at,
            });
        }
    }

    /// Accrue interest and refresh the cached price without any other change
    ///
    /// Used by keepers to bring the index current before scanning accounts.
    pub fn tick(&mut self, now: u64) -> Result<AccrualStep> {
        let _entry = self.lock.enter()?;
        let step = self.stage_accrual(now)?;
        self.commit_accrual(&step);
        Ok(step)
    }

    fn cached_price(&self) -> PriceObservation {
        PriceObservation {
            price: self.state.collateral_price,
            observed_at: self.state.price_observed_at,
        }
    }
}
