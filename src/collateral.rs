//! Collateral ledger: deposits, withdrawals and collateralization ratios

use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::math::{add_u128, sub_u128};
use crate::oracle::PriceSource;
use crate::pool::{collateral_ratio, current_debt_at, transfer_failed, LendingPool};
use crate::state::{AccountId, CollateralRatio};
use crate::transfer::{Asset, AssetTransfer};

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Post `amount` of collateral for `account`
    pub fn deposit(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        let _entry = self.lock.enter()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let mut entry = self.account_view(account);
        entry.collateral = add_u128(entry.collateral, amount)?;
        let total_collateral = add_u128(self.state.total_collateral, amount)?;

        self.transfer
            .transfer_in(Asset::Collateral, account, amount)
            .map_err(|e| transfer_failed("deposit", account, e))?;

        self.commit_accrual(&step);
        self.state.total_collateral = total_collateral;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::CollateralDeposited {
            at: now,
            account: account.clone(),
            amount,
        });
        log::info!("deposit: {} posted {} collateral", account, amount);
        Ok(())
    }

    /// Return `amount` of collateral to `account`
    ///
    /// # Errors
    /// * `InsufficientBalance` if the account holds less than `amount`
    /// * `Undercollateralized` if the remaining collateral would not cover
    ///   the account's debt at the threshold
    pub fn withdraw(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        let _entry = self.lock.enter()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let mut entry = self.account_view(account);
        if entry.collateral < amount {
            return Err(LedgerError::InsufficientBalance);
        }
        let remaining = entry.collateral - amount;
        let debt = current_debt_at(&entry, step.accrual_index)?;
        let ratio = collateral_ratio(remaining, step.collateral_price, debt);
        if ratio.is_below(self.params.collateral_ratio_threshold) {
            log::debug!(
                "withdraw: {} would drop to ratio {} (threshold {})",
                account,
                ratio,
                self.params.collateral_ratio_threshold
            );
            return Err(LedgerError::Undercollateralized);
        }
        entry.collateral = remaining;
        let total_collateral = sub_u128(self.state.total_collateral, amount)?;

        self.transfer
            .transfer_out(Asset::Collateral, account, amount)
            .map_err(|e| transfer_failed("withdraw", account, e))?;

        self.commit_accrual(&step);
        self.state.total_collateral = total_collateral;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::CollateralWithdrawn {
            at: now,
            account: account.clone(),
            amount,
        });
        log::info!("withdraw: {} took back {} collateral", account, amount);
        Ok(())
    }

    /// Collateralization ratio at the stored index and cached price
    ///
    /// Read-only: does not accrue. Call [`LendingPool::tick`] first for a
    /// ratio as of a specific time.
    pub fn ratio(&self, account: &AccountId) -> Result<CollateralRatio> {
        let entry = self.account_view(account);
        let debt = current_debt_at(&entry, self.state.accrual_index)?;
        Ok(collateral_ratio(entry.collateral, self.state.collateral_price, debt))
    }
}
