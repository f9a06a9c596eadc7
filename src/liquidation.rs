//! Liquidation of undercollateralized accounts
//!
//! A liquidator pays down part of an unhealthy account's debt in the base
//! asset and receives collateral in exchange. The debt relief for a seizure
//! is the seized collateral's value at the cached price, reduced by the
//! configured bonus:
//!
//! `relief = seize * price * BPS / (BPS + bonus_bps)`
//!
//! Relief is capped at the outstanding debt. Seizing all remaining
//! collateral closes the account: any debt the collateral could not cover
//! is written off as bad debt.

use serde::Serialize;

use crate::error::{LedgerError, Result, TransferError};
use crate::events::LedgerEvent;
use crate::math::{mul_div_floor, sub_u128, Wad, BPS};
use crate::oracle::PriceSource;
use crate::pool::{collateral_ratio, current_debt_at, transfer_failed, LendingPool};
use crate::state::AccountId;
use crate::transfer::{Asset, AssetTransfer};

/// Result of a successful liquidation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LiquidationOutcome {
    /// Collateral moved to the liquidator
    pub seized: u128,
    /// Base asset paid in by the liquidator
    pub debt_repaid: u128,
    /// Debt written off (full seizure of an underwater account only)
    pub bad_debt: u128,
    /// Debt the account still owes
    pub remaining_debt: u128,
}

/// Debt relief granted for seizing `seize` collateral units at `price`
pub fn seizure_relief(seize: u128, price: Wad, bonus_bps: u64) -> Result<u128> {
    let value = price.apply_floor(seize)?;
    mul_div_floor(value, BPS, BPS + bonus_bps as u128)
}

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Seize `seize_amount` of `account`'s collateral on behalf of `liquidator`
    ///
    /// # Errors
    /// * `NotLiquidatable` if the account has no debt or its ratio is at or
    ///   above the threshold
    /// * `InsufficientBalance` if `seize_amount` exceeds the posted collateral
    /// * `InvalidAmount` if a partial seizure is too small to reduce the debt
    /// * `TransferFailed` if either leg fails; a completed payment leg is
    ///   refunded before returning, and a refund that fails too is added to
    ///   `stranded_payments` with a `RefundFailed` event
    pub fn liquidate(
        &mut self,
        liquidator: &AccountId,
        account: &AccountId,
        seize_amount: u128,
        now: u64,
    ) -> Result<LiquidationOutcome> {
        let _entry = self.lock.enter()?;
        if seize_amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let before = self.account_view(account);
        let debt = current_debt_at(&before, step.accrual_index)?;
        if debt == 0 {
            return Err(LedgerError::NotLiquidatable);
        }
        let ratio = collateral_ratio(before.collateral, step.collateral_price, debt);
        if !ratio.is_below(self.params.collateral_ratio_threshold) {
            log::debug!(
                "liquidate: {} is healthy at ratio {} (threshold {})",
                account,
                ratio,
                self.params.collateral_ratio_threshold
            );
            return Err(LedgerError::NotLiquidatable);
        }
        if seize_amount > before.collateral {
            return Err(LedgerError::InsufficientBalance);
        }

        let relief = seizure_relief(
            seize_amount,
            step.collateral_price,
            self.params.liquidation_bonus_bps,
        )?;
        let debt_repaid = relief.min(debt);
        let full = seize_amount == before.collateral;
        if !full && debt_repaid == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let (remaining_debt, bad_debt) = if full {
            (0, debt - debt_repaid)
        } else {
            (debt - debt_repaid, 0)
        };

        let mut entry = before.clone();
        entry.collateral -= seize_amount;
        entry.borrow_principal = remaining_debt;
        entry.checkpoint_index = step.accrual_index;
        let total_collateral = sub_u128(self.state.total_collateral, seize_amount)?;
        let (normalized_debt, total_borrowed) =
            self.rebase_debt(&before, &entry, step.accrual_index)?;
        let total_bad_debt = self.state.bad_debt.saturating_add(bad_debt);

        if debt_repaid > 0 {
            self.transfer
                .transfer_in(Asset::Base, liquidator, debt_repaid)
                .map_err(|e| transfer_failed("liquidate", liquidator, e))?;
        }
        if let Err(e) = self
            .transfer
            .transfer_out(Asset::Collateral, liquidator, seize_amount)
        {
            if debt_repaid > 0 {
                if let Err(refund) =
                    self.transfer.transfer_out(Asset::Base, liquidator, debt_repaid)
                {
                    self.strand_payment(liquidator, debt_repaid, now, refund);
                }
            }
            return Err(transfer_failed("liquidate", liquidator, e));
        }

        self.commit_accrual(&step);
        self.state.total_collateral = total_collateral;
        self.state.normalized_debt = normalized_debt;
        self.state.total_borrowed = total_borrowed;
        self.state.bad_debt = total_bad_debt;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::Liquidated {
            at: now,
            liquidator: liquidator.clone(),
            account: account.clone(),
            seized: seize_amount,
            debt_repaid,
            bad_debt,
        });
        log::info!(
            "liquidate: {} seized {} collateral from {} for {} debt",
            liquidator,
            seize_amount,
            account,
            debt_repaid
        );
        if bad_debt > 0 {
            log::warn!("liquidate: wrote off {} bad debt for {}", bad_debt, account);
        }

        Ok(LiquidationOutcome {
            seized: seize_amount,
            debt_repaid,
            bad_debt,
            remaining_debt,
        })
    }

    /// Keep a payment whose refund failed out of the pool's own funds
    ///
    /// The only ledger write on a failed liquidation. The payment sits in
    /// custody until it is returned outside the ledger.
    fn strand_payment(
        &mut self,
        liquidator: &AccountId,
        amount: u128,
        now: u64,
        err: TransferError,
    ) {
        self.state.stranded_payments = self.state.stranded_payments.saturating_add(amount);
        self.record(LedgerEvent::RefundFailed {
            at: now,
            liquidator: liquidator.clone(),
            amount,
        });
        log::error!(
            "liquidate: refund of {} to {} failed: {} ({} stranded in total)",
            amount,
            liquidator,
            err,
            self.state.stranded_payments
        );
    }
}
