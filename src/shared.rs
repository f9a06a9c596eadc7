//! Shared handle to a pool for front ends and collaborator hooks
//!
//! A `SharedPool` may be cloned into an asset-transfer hook. Any call made
//! through it while an operation is running fails with `Reentrant` before
//! touching the pool.

use std::cell::RefCell;
use std::rc::Rc;

use crate::accrual::AccrualStep;
use crate::error::{LedgerError, Result};
use crate::guard::EntryLock;
use crate::liquidation::LiquidationOutcome;
use crate::math::Wad;
use crate::oracle::PriceSource;
use crate::pool::LendingPool;
use crate::state::{AccountId, CollateralRatio, PoolSnapshot};
use crate::transfer::AssetTransfer;

pub struct SharedPool<T, P> {
    inner: Rc<RefCell<LendingPool<T, P>>>,
    lock: EntryLock,
}

impl<T, P> Clone for SharedPool<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            lock: self.lock.clone(),
        }
    }
}

impl<T: AssetTransfer, P: PriceSource> SharedPool<T, P> {
    pub fn new(pool: LendingPool<T, P>) -> Self {
        let lock = pool.entry_lock();
        Self {
            inner: Rc::new(RefCell::new(pool)),
            lock,
        }
    }

    fn with_mut<R>(&self, op: impl FnOnce(&mut LendingPool<T, P>) -> Result<R>) -> Result<R> {
        if self.lock.is_held() {
            log::warn!("shared: call rejected while an operation is in progress");
            return Err(LedgerError::Reentrant);
        }
        let mut pool = self.inner.try_borrow_mut().map_err(|_| LedgerError::Reentrant)?;
        op(&mut pool)
    }

    fn with_ref<R>(&self, op: impl FnOnce(&LendingPool<T, P>) -> Result<R>) -> Result<R> {
        let pool = self.inner.try_borrow().map_err(|_| LedgerError::Reentrant)?;
        op(&pool)
    }

    pub fn deposit(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_mut(|pool| pool.deposit(account, amount, now))
    }

    pub fn withdraw(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_mut(|pool| pool.withdraw(account, amount, now))
    }

    pub fn borrow(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_mut(|pool| pool.borrow(account, amount, now))
    }

    pub fn repay(&self, account: &AccountId, amount: u128, now: u64) -> Result<()> {
        self.with_mut(|pool| pool.repay(account, amount, now))
    }

    pub fn mint(&self, account: &AccountId, amount: u128, now: u64) -> Result<u128> {
        self.with_mut(|pool| pool.mint(account, amount, now))
    }

    pub fn redeem(&self, account: &AccountId, shares: u128, now: u64) -> Result<u128> {
        self.with_mut(|pool| pool.redeem(account, shares, now))
    }

    pub fn liquidate(
        &self,
        liquidator: &AccountId,
        account: &AccountId,
        seize_amount: u128,
        now: u64,
    ) -> Result<LiquidationOutcome> {
        self.with_mut(|pool| pool.liquidate(liquidator, account, seize_amount, now))
    }

    pub fn tick(&self, now: u64) -> Result<AccrualStep> {
        self.with_mut(|pool| pool.tick(now))
    }

    pub fn ratio(&self, account: &AccountId) -> Result<CollateralRatio> {
        self.with_ref(|pool| pool.ratio(account))
    }

    pub fn current_debt(&self, account: &AccountId) -> Result<u128> {
        self.with_ref(|pool| pool.current_debt(account))
    }

    pub fn exchange_rate(&self) -> Result<Wad> {
        self.with_ref(|pool| pool.exchange_rate())
    }

    pub fn pool_state(&self) -> Result<PoolSnapshot> {
        self.with_ref(|pool| pool.pool_state())
    }

    pub fn check_invariants(&self) -> Result<bool> {
        self.with_ref(|pool| Ok(pool.check_invariants()))
    }

    /// Run `f` against the pool outside of any operation
    pub fn inspect<R>(&self, f: impl FnOnce(&LendingPool<T, P>) -> R) -> Result<R> {
        self.with_ref(|pool| Ok(f(pool)))
    }
}
