//! Ledger event journal
//!
//! Every committed state transition appends one event. The journal is a
//! bounded FIFO: once `capacity` is reached the oldest event is dropped.

use std::collections::VecDeque;

use serde::Serialize;

use crate::math::Wad;
use crate::state::AccountId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Accrued {
        at: u64,
        elapsed_intervals: u64,
        growth: Wad,
        accrual_index: Wad,
        total_borrowed: u128,
    },
    PriceRefreshed {
        at: u64,
        price: Wad,
        observed_at: u64,
    },
    CollateralDeposited {
        at: u64,
        account: AccountId,
        amount: u128,
    },
    CollateralWithdrawn {
        at: u64,
        account: AccountId,
        amount: u128,
    },
    Borrowed {
        at: u64,
        account: AccountId,
        amount: u128,
        debt: u128,
    },
    Repaid {
        at: u64,
        account: AccountId,
        amount: u128,
        debt: u128,
    },
    SharesMinted {
        at: u64,
        account: AccountId,
        assets: u128,
        shares: u128,
    },
    SharesRedeemed {
        at: u64,
        account: AccountId,
        shares: u128,
        assets: u128,
    },
    Liquidated {
        at: u64,
        liquidator: AccountId,
        account: AccountId,
        seized: u128,
        debt_repaid: u128,
        bad_debt: u128,
    },
    /// A liquidation's collateral leg and the refund of its payment both
    /// failed; `amount` stays in custody as a stranded payment
    RefundFailed {
        at: u64,
        liquidator: AccountId,
        amount: u128,
    },
}

#[derive(Clone, Debug)]
pub struct EventJournal {
    events: VecDeque<LedgerEvent>,
    capacity: usize,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, event: LedgerEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter()
    }

    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
