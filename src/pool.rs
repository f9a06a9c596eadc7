//! The lending pool engine
//!
//! `LendingPool` owns every account entry, the pool totals and the accrual
//! index. Operations are split across modules by concern (`accrual`,
//! `collateral`, `borrow`, `shares`, `liquidation`) as separate `impl`
//! blocks on this type.
//!
//! Each mutating operation follows the same shape:
//! 1. acquire the entry guard
//! 2. stage the accrual step and every state change in locals
//! 3. request asset transfers
//! 4. commit the staged values
//!
//! Nothing is written to `self` before step 4, so an error at any point
//! leaves the ledger untouched.

use std::collections::BTreeMap;

use crate::config::{PoolConfig, PoolParams};
use crate::error::{LedgerError, Result, TransferError};
use crate::events::{EventJournal, LedgerEvent};
use crate::guard::EntryLock;
use crate::math::{add_u128, mul_div_ceil, mul_div_floor, sub_u128, Wad, WAD};
use crate::oracle::{PriceOracleAdapter, PriceSource};
use crate::state::{Account, AccountId, CollateralRatio, PoolSnapshot, PoolState};
use crate::transfer::{Asset, AssetTransfer};

/// Scale of normalized debt: one base unit at index 1.0 is `1e27`
///
/// The nine decimals beyond the Wad index keep the pool total exact for a
/// debt recorded at the current index.
pub const NORMALIZED_SCALE: u128 = WAD * 1_000_000_000;

pub struct LendingPool<T, P> {
    pub(crate) params: PoolParams,
    pub(crate) state: PoolState,
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) transfer: T,
    pub(crate) oracle: PriceOracleAdapter<P>,
    pub(crate) lock: EntryLock,
    pub(crate) journal: EventJournal,
}

impl<T: AssetTransfer, P: PriceSource> LendingPool<T, P> {
    /// Create an empty pool with accrual starting at `now`
    pub fn new(config: &PoolConfig, transfer: T, source: P, now: u64) -> Result<Self> {
        let params = config.validate()?;
        log::info!(
            "pool: created (rate {}, ratio threshold {}, interval {}s, max price age {}s)",
            params.annual_rate,
            params.collateral_ratio_threshold,
            params.min_interval,
            params.max_price_age
        );
        Ok(Self {
            state: PoolState::new(now),
            accounts: BTreeMap::new(),
            transfer,
            oracle: PriceOracleAdapter::new(source, params.max_price_age),
            lock: EntryLock::new(),
            journal: EventJournal::new(params.event_log_capacity),
            params,
        })
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn price_source(&self) -> &P {
        self.oracle.source()
    }

    /// Handle to the in-progress flag, shared with front ends
    pub fn entry_lock(&self) -> EntryLock {
        self.lock.clone()
    }

    pub fn events(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.journal.iter()
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.journal.drain()
    }

    /// Read-only pool totals
    pub fn pool_state(&self) -> Result<PoolSnapshot> {
        Ok(PoolSnapshot {
            total_shares: self.state.total_shares,
            total_borrowed: self.state.total_borrowed,
            total_collateral: self.state.total_collateral,
            pool_asset_balance: self.transfer.balance_of(Asset::Base),
            stranded_payments: self.state.stranded_payments,
            exchange_rate: self.exchange_rate()?,
            accrual_index: self.state.accrual_index,
            last_accrual_time: self.state.last_accrual_time,
            collateral_price: self.state.collateral_price,
            price_observed_at: self.state.price_observed_at,
            bad_debt: self.state.bad_debt,
            accrual_count: self.state.accrual_count,
            accounts: self.accounts.len(),
        })
    }

    // ========================================
    // Staging helpers
    // ========================================

    /// Copy of the stored entry, or a zeroed entry for unknown accounts
    pub(crate) fn account_view(&self, id: &AccountId) -> Account {
        self.accounts.get(id).cloned().unwrap_or_default()
    }

    pub(crate) fn record(&mut self, event: LedgerEvent) {
        self.journal.record(event);
    }

    /// Base asset in custody that belongs to the pool
    pub(crate) fn base_available(&self) -> u128 {
        self.transfer
            .balance_of(Asset::Base)
            .saturating_sub(self.state.stranded_payments)
    }

    /// Normalized sum and pool total after `before` is replaced by `after`
    pub(crate) fn rebase_debt(
        &self,
        before: &Account,
        after: &Account,
        index: Wad,
    ) -> Result<(u128, u128)> {
        let normalized = sub_u128(self.state.normalized_debt, normalized_debt_of(before)?)?;
        let normalized = add_u128(normalized, normalized_debt_of(after)?)?;
        Ok((normalized, borrowed_at(normalized, index)?))
    }

    // ========================================
    // Invariants
    // ========================================

    /// Check ledger consistency
    ///
    /// * sum of account collateral equals `total_collateral`
    /// * sum of account shares equals `total_shares`
    /// * sum of normalized account debts equals `normalized_debt`, and
    ///   `total_borrowed` is that sum valued at the current index
    /// * `total_borrowed` is at least the sum of current debts and exceeds
    ///   it by at most one unit per borrower (each debt is floored alone)
    /// * the accrual index never fell below 1.0
    pub fn check_invariants(&self) -> bool {
        let mut collateral: u128 = 0;
        let mut shares: u128 = 0;
        let mut debt: u128 = 0;
        let mut normalized: u128 = 0;
        let mut debtors: u128 = 0;

        for account in self.accounts.values() {
            collateral = collateral.saturating_add(account.collateral);
            shares = shares.saturating_add(account.shares);
            if account.has_debt() {
                let (Ok(d), Ok(n)) = (
                    current_debt_at(account, self.state.accrual_index),
                    normalized_debt_of(account),
                ) else {
                    return false;
                };
                debt = debt.saturating_add(d);
                normalized = normalized.saturating_add(n);
                debtors += 1;
            }
        }

        if collateral != self.state.total_collateral {
            log::warn!(
                "invariant: collateral sum {} != total {}",
                collateral,
                self.state.total_collateral
            );
            return false;
        }
        if shares != self.state.total_shares {
            log::warn!("invariant: share sum {} != total {}", shares, self.state.total_shares);
            return false;
        }
        if normalized != self.state.normalized_debt {
            log::warn!(
                "invariant: normalized debt sum {} != total {}",
                normalized,
                self.state.normalized_debt
            );
            return false;
        }
        if borrowed_at(normalized, self.state.accrual_index).ok() != Some(self.state.total_borrowed) {
            log::warn!(
                "invariant: total borrowed {} does not match normalized debt {} at index {}",
                self.state.total_borrowed,
                normalized,
                self.state.accrual_index
            );
            return false;
        }
        if self.state.total_borrowed < debt || self.state.total_borrowed - debt > debtors {
            log::warn!(
                "invariant: total borrowed {} outside [{}, {}] for {} borrowers",
                self.state.total_borrowed,
                debt,
                debt.saturating_add(debtors),
                debtors
            );
            return false;
        }
        self.state.accrual_index >= Wad::ONE
    }
}

// ============================================================================
// Shared pure helpers
// ============================================================================

/// Debt of `account` valued at accrual index `index`, rounded down
pub(crate) fn current_debt_at(account: &Account, index: Wad) -> Result<u128> {
    if account.borrow_principal == 0 {
        return Ok(0);
    }
    mul_div_floor(account.borrow_principal, index.raw(), account.checkpoint_index.raw())
}

/// Debt of `account` expressed at index 1.0, scaled by `NORMALIZED_SCALE`
///
/// Rounded up, so valuing it back at the checkpoint index returns exactly
/// the recorded principal.
pub(crate) fn normalized_debt_of(account: &Account) -> Result<u128> {
    if account.borrow_principal == 0 {
        return Ok(0);
    }
    mul_div_ceil(
        account.borrow_principal,
        NORMALIZED_SCALE,
        account.checkpoint_index.raw(),
    )
}

/// Pool total for a normalized debt sum at accrual index `index`
pub(crate) fn borrowed_at(normalized: u128, index: Wad) -> Result<u128> {
    mul_div_floor(normalized, index.raw(), NORMALIZED_SCALE)
}

/// `collateral * price / debt`, or `Infinite` without debt
///
/// Saturates instead of failing: an overflow here means the account is
/// healthy by many orders of magnitude.
pub(crate) fn collateral_ratio(collateral: u128, price: Wad, debt: u128) -> CollateralRatio {
    if debt == 0 {
        return CollateralRatio::Infinite;
    }
    match mul_div_floor(collateral, price.raw(), debt) {
        Ok(ratio) => CollateralRatio::Finite(Wad(ratio)),
        Err(_) => CollateralRatio::Finite(Wad(u128::MAX)),
    }
}

pub(crate) fn transfer_failed(op: &str, account: &AccountId, err: TransferError) -> LedgerError {
    log::warn!("{}: transfer for {} failed: {}", op, account, err);
    LedgerError::TransferFailed(err)
}
