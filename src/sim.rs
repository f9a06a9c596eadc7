//! In-memory collaborators for simulation and tests
//!
//! Both types are cheap cloneable handles over shared state, so a scenario
//! runner can keep a copy to fund wallets or move the price while the pool
//! owns the other.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::TransferError;
use crate::math::Wad;
use crate::oracle::{PriceObservation, PriceSource};
use crate::state::AccountId;
use crate::transfer::{Asset, AssetTransfer};

type TransferHook = Box<dyn FnMut(Asset, &AccountId, u128)>;

#[derive(Default)]
struct AssetBook {
    wallets: BTreeMap<(AccountId, Asset), u128>,
    pool: BTreeMap<Asset, u128>,
    fail_next: usize,
    transfers: u64,
    hook: Option<TransferHook>,
}

/// Wallet balances plus pool custody for both assets
#[derive(Clone, Default)]
pub struct InMemoryAssets(Rc<RefCell<AssetBook>>);

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external wallet
    pub fn fund(&self, account: &AccountId, asset: Asset, amount: u128) {
        let mut book = self.0.borrow_mut();
        let balance = book.wallets.entry((account.clone(), asset)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn wallet_balance(&self, account: &AccountId, asset: Asset) -> u128 {
        let book = self.0.borrow();
        book.wallets.get(&(account.clone(), asset)).copied().unwrap_or(0)
    }

    pub fn pool_balance(&self, asset: Asset) -> u128 {
        self.0.borrow().pool.get(&asset).copied().unwrap_or(0)
    }

    /// Number of successful transfers executed
    pub fn transfer_count(&self) -> u64 {
        self.0.borrow().transfers
    }

    /// Reject the next `count` transfer requests
    pub fn fail_next_transfers(&self, count: usize) {
        self.0.borrow_mut().fail_next = count;
    }

    /// Install a callback run at the start of every transfer request
    pub fn set_hook(&self, hook: impl FnMut(Asset, &AccountId, u128) + 'static) {
        self.0.borrow_mut().hook = Some(Box::new(hook));
    }

    pub fn clear_hook(&self) {
        self.0.borrow_mut().hook = None;
    }

    fn run_hook(&self, asset: Asset, account: &AccountId, amount: u128) {
        // The hook may call back into this book, so it runs unborrowed
        let hook = self.0.borrow_mut().hook.take();
        if let Some(mut hook) = hook {
            hook(asset, account, amount);
            let mut book = self.0.borrow_mut();
            if book.hook.is_none() {
                book.hook = Some(hook);
            }
        }
    }

    fn take_injected_failure(book: &mut AssetBook) -> Result<(), TransferError> {
        if book.fail_next > 0 {
            book.fail_next -= 1;
            return Err(TransferError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }
}

impl AssetTransfer for InMemoryAssets {
    fn transfer_in(
        &mut self,
        asset: Asset,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.run_hook(asset, from, amount);
        let mut book = self.0.borrow_mut();
        Self::take_injected_failure(&mut book)?;

        let available = book.wallets.get(&(from.clone(), asset)).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                asset,
                needed: amount,
                available,
            });
        }
        book.wallets.insert((from.clone(), asset), available - amount);
        let held = book.pool.entry(asset).or_insert(0);
        *held = held.saturating_add(amount);
        book.transfers += 1;
        Ok(())
    }

    fn transfer_out(
        &mut self,
        asset: Asset,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.run_hook(asset, to, amount);
        let mut book = self.0.borrow_mut();
        Self::take_injected_failure(&mut book)?;

        let available = book.pool.get(&asset).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                asset,
                needed: amount,
                available,
            });
        }
        book.pool.insert(asset, available - amount);
        let wallet = book.wallets.entry((to.clone(), asset)).or_insert(0);
        *wallet = wallet.saturating_add(amount);
        book.transfers += 1;
        Ok(())
    }

    fn balance_of(&self, asset: Asset) -> u128 {
        self.pool_balance(asset)
    }
}

/// Price feed moved by hand
#[derive(Clone, Debug, Default)]
pub struct ManualPriceFeed(Rc<Cell<Option<PriceObservation>>>);

impl ManualPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, price: Wad, observed_at: u64) {
        self.0.set(Some(PriceObservation { price, observed_at }));
    }

    /// Simulate a feed outage
    pub fn clear(&self) {
        self.0.set(None);
    }
}

impl PriceSource for ManualPriceFeed {
    fn latest(&self) -> Option<PriceObservation> {
        self.0.get()
    }
}
