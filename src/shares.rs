//! Share accounting: depositor claims on pool assets
//!
//! Pool assets are the base asset held by the pool plus everything lent
//! out. Shares are minted and redeemed at
//! `exchange_rate = (pool_balance + total_borrowed) / total_shares`,
//! so accrued interest raises the value of every outstanding share.
//! Conversions round down in both directions.

use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::math::{add_u128, mul_div_floor, sub_u128, Wad};
use crate::oracle::PriceSource;
use crate::pool::{transfer_failed, LendingPool};
use crate::state::AccountId;
use crate::transfer::{Asset, AssetTransfer};

/// Base-asset value backing all shares
pub fn total_assets(pool_balance: u128, total_borrowed: u128) -> Result<u128> {
    add_u128(pool_balance, total_borrowed)
}

/// Assets per share; 1.0 while no shares exist
pub fn exchange_rate_of(total_assets: u128, total_shares: u128) -> Result<Wad> {
    if total_shares == 0 {
        return Ok(Wad::ONE);
    }
    Wad::from_ratio(total_assets, total_shares)
}

/// Shares minted for `amount` of base asset, rounded down
pub fn shares_for_assets(amount: u128, total_assets: u128, total_shares: u128) -> Result<u128> {
    if total_shares == 0 {
        return Ok(amount);
    }
    if total_assets == 0 {
        // Outstanding shares backed by nothing: minting would be unpriceable
        return Err(LedgerError::InsufficientLiquidity);
    }
    mul_div_floor(amount, total_shares, total_assets)
}

/// Base-asset value of `shares`, rounded down
pub fn assets_for_shares(shares: u128, total_assets: u128, total_shares: u128) -> Result<u128> {
    if total_shares == 0 {
        return Ok(0);
    }
    mul_div_floor(shares, total_assets, total_shares)
}

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Current assets per share (stored totals, no accrual)
    pub fn exchange_rate(&self) -> Result<Wad> {
        let assets = total_assets(self.base_available(), self.state.total_borrowed)?;
        exchange_rate_of(assets, self.state.total_shares)
    }

    /// Supply `amount` of base asset and receive claim-shares
    ///
    /// Returns the number of shares minted.
    ///
    /// # Errors
    /// * `InvalidAmount` if `amount` is zero or too small to mint one share
    pub fn mint(&mut self, account: &AccountId, amount: u128, now: u64) -> Result<u128> {
        let _entry = self.lock.enter()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let assets = total_assets(self.base_available(), step.total_borrowed)?;
        let minted = shares_for_assets(amount, assets, self.state.total_shares)?;
        if minted == 0 {
            log::debug!("mint: {} too small to mint a share at {} assets", amount, assets);
            return Err(LedgerError::InvalidAmount);
        }
        let mut entry = self.account_view(account);
        entry.shares = add_u128(entry.shares, minted)?;
        let total_shares = add_u128(self.state.total_shares, minted)?;

        self.transfer
            .transfer_in(Asset::Base, account, amount)
            .map_err(|e| transfer_failed("mint", account, e))?;

        self.commit_accrual(&step);
        self.state.total_shares = total_shares;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::SharesMinted {
            at: now,
            account: account.clone(),
            assets: amount,
            shares: minted,
        });
        log::info!("mint: {} supplied {} for {} shares", account, amount, minted);
        Ok(minted)
    }

    /// Burn `shares` and receive their base-asset value
    ///
    /// Returns the amount paid out.
    ///
    /// # Errors
    /// * `InsufficientBalance` if the account holds fewer shares
    /// * `InvalidAmount` if the shares are worth nothing
    /// * `InsufficientLiquidity` if paying out would leave the pool holding
    ///   less than `total_borrowed`
    pub fn redeem(&mut self, account: &AccountId, shares: u128, now: u64) -> Result<u128> {
        let _entry = self.lock.enter()?;
        if shares == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let step = self.stage_accrual(now)?;

        let mut entry = self.account_view(account);
        if entry.shares < shares {
            return Err(LedgerError::InsufficientBalance);
        }
        let pool_balance = self.base_available();
        let assets = total_assets(pool_balance, step.total_borrowed)?;
        let value = assets_for_shares(shares, assets, self.state.total_shares)?;
        if value == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if value > pool_balance || pool_balance - value < step.total_borrowed {
            log::debug!(
                "redeem: {} asked for {} but pool holds {} against {} borrowed",
                account,
                value,
                pool_balance,
                step.total_borrowed
            );
            return Err(LedgerError::InsufficientLiquidity);
        }
        entry.shares -= shares;
        let total_shares = sub_u128(self.state.total_shares, shares)?;

        self.transfer
            .transfer_out(Asset::Base, account, value)
            .map_err(|e| transfer_failed("redeem", account, e))?;

        self.commit_accrual(&step);
        self.state.total_shares = total_shares;
        self.accounts.insert(account.clone(), entry);
        self.record(LedgerEvent::SharesRedeemed {
            at: now,
            account: account.clone(),
            shares,
            assets: value,
        });
        log::info!("redeem: {} burned {} shares for {}", account, shares, value);
        Ok(value)
    }
}
