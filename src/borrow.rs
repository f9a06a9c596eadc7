//! Borrow ledger: drawing and repaying base-asset debt
//!
//! Debt is stored as a principal plus the accrual index at which it was
//! recorded. Every borrow or repay first brings the principal current and
//! then rebases the checkpoint to the present index, swapping the account's
//! old normalized debt for the new one in the pool sum.

use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::math::add_u128;
use crate::oracle::PriceSource;
use crate::pool::{collateral_ratio, current_debt_at, transfer_failed, LendingPool};
use crate::state::AccountId;
use crate::transfer::{Asset, AssetTransfer};

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Draw `amount` of the base asset against posted collateral
    ///
    /// # Errors
    /// * `InsufficientLiquidity` if the pool holds less than `amount`
    /// * `InsufficientCollateral` if the new debt would breach the threshold
    pub fn borrow(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        let _entry = self.lock.enter()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let available = self.base_available();
        if amount > available {
            log::debug!("borrow: {} requested {} but pool holds {}", account, amount, available);
            return Err(LedgerError::InsufficientLiquidity);
        }

        let before = self.account_view(account);
        let debt = current_debt_at(&before, step.accrual_index)?;
        let new_debt = add_u128(debt, amount)?;
        let ratio = collateral_ratio(before.collateral, step.collateral_price, new_debt);
        if ratio.is_below(self.params.collateral_ratio_threshold) {
            log::debug!(
                "borrow: {} would reach ratio {} (threshold {})",
                account,
                ratio,
                self.params.collateral_ratio_threshold
            );
            return Err(LedgerError::InsufficientCollateral);
        }
        let mut entry = before.clone();
        entry.borrow_principal = new_debt;
        entry.checkpoint_index = step.accrual_index;
        let (normalized_debt, total_borrowed) =
            self.rebase_debt(&before, &entry, step.accrual_index)?;

        self.transfer
            .transfer_out(Asset::Base, account, amount)
            .map_err(|e| transfer_failed("borrow", account, e))?;

        self.commit_accrual(&step);
        self.state.normalized_debt = normalized_debt;
        self.state.total_borrowed = total_borrowed;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::Borrowed {
            at: now,
            account: account.clone(),
            amount,
            debt: new_debt,
        });
        log::info!("borrow: {} drew {} (debt now {})", account, amount, new_debt);
        Ok(())
    }

    /// Pay down `amount` of the account's debt
    ///
    /// # Errors
    /// * `InvalidAmount` if `amount` is zero or exceeds the current debt
    pub fn repay(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        let _entry = self.lock.enter()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let before = self.account_view(account);
        let debt = current_debt_at(&before, step.accrual_index)?;
        if amount > debt {
            log::debug!("repay: {} offered {} against debt {}", account, amount, debt);
            return Err(LedgerError::InvalidAmount);
        }
        let new_debt = debt - amount;
        let mut entry = before.clone();
        entry.borrow_principal = new_debt;
        entry.checkpoint_index = step.accrual_index;
        let (normalized_debt, total_borrowed) =
            self.rebase_debt(&before, &entry, step.accrual_index)?;

        self.transfer
            .transfer_in(Asset::Base, account, amount)
            .map_err(|e| transfer_failed("repay", account, e))?;

        self.commit_accrual(&step);
        self.state.normalized_debt = normalized_debt;
        self.state.total_borrowed = total_borrowed;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::Repaid {
            at: now,
            account: account.clone(),
            amount,
            debt: new_debt,
        });
        log::info!("repay: {} paid {} (debt now {})", account, amount, new_debt);
        Ok(())
    }

    /// Debt owed by `account` at the stored accrual index
    pub fn current_debt(&self, account: &AccountId) -> Result<u128> {
        match self.accounts.get(account) {
            Some(entry) => current_debt_at(entry, self.state.accrual_index),
            None => Ok(0),
        }
    }
}
