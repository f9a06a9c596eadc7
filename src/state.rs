//! Core data structures: accounts, pool totals and read-only snapshots

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Wad;

/// Opaque account key supplied by the caller's identity layer
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Per-account ledger entry
///
/// Depositor (shares) and borrower (collateral/debt) state live side by side;
/// one identity may be both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Collateral units posted
    pub collateral: u128,

    /// Debt recorded at `checkpoint_index`
    pub borrow_principal: u128,

    /// Accrual index at the last debt update (zero until first borrow)
    pub checkpoint_index: Wad,

    /// Claim-shares held
    pub shares: u128,
}

impl Account {
    pub fn has_debt(&self) -> bool {
        self.borrow_principal > 0
    }

    /// True when every balance is zero
    pub fn is_empty(&self) -> bool {
        self.collateral == 0 && self.borrow_principal == 0 && self.shares == 0
    }
}

/// Pool-wide totals and accrual state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolState {
    /// Outstanding claim-shares
    pub total_shares: u128,

    /// Aggregate debt, `normalized_debt` valued at the current index
    pub total_borrowed: u128,

    /// Sum of every account's debt expressed at index 1.0, carried with
    /// nine extra decimals (see `pool::NORMALIZED_SCALE`)
    pub normalized_debt: u128,

    /// Aggregate posted collateral
    pub total_collateral: u128,

    /// Global accrual index (starts at 1.0, never decreases)
    pub accrual_index: Wad,

    /// Timestamp of the last index update
    pub last_accrual_time: u64,

    /// Cached collateral price in base-asset terms (zero until first refresh)
    pub collateral_price: Wad,

    /// Oracle timestamp of the cached price
    pub price_observed_at: u64,

    /// Debt written off by full liquidations of underwater accounts
    pub bad_debt: u128,

    /// Liquidator payments held after a failed refund, owed back off-ledger
    ///
    /// Excluded from the base asset available to depositors and borrowers.
    pub stranded_payments: u128,

    /// Number of accruals applied since creation
    pub accrual_count: u64,
}

impl PoolState {
    pub fn new(now: u64) -> Self {
        Self {
            total_shares: 0,
            total_borrowed: 0,
            normalized_debt: 0,
            total_collateral: 0,
            accrual_index: Wad::ONE,
            last_accrual_time: now,
            collateral_price: Wad::ZERO,
            price_observed_at: 0,
            bad_debt: 0,
            stranded_payments: 0,
            accrual_count: 0,
        }
    }
}

/// Collateralization ratio
///
/// Accounts without debt are `Infinite`, which orders above every finite ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CollateralRatio {
    Finite(Wad),
    Infinite,
}

impl CollateralRatio {
    pub fn is_below(self, threshold: Wad) -> bool {
        match self {
            CollateralRatio::Finite(r) => r < threshold,
            CollateralRatio::Infinite => false,
        }
    }

    pub fn finite(self) -> Option<Wad> {
        match self {
            CollateralRatio::Finite(r) => Some(r),
            CollateralRatio::Infinite => None,
        }
    }
}

impl PartialOrd for CollateralRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CollateralRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CollateralRatio::Finite(a), CollateralRatio::Finite(b)) => a.cmp(b),
            (CollateralRatio::Finite(_), CollateralRatio::Infinite) => Ordering::Less,
            (CollateralRatio::Infinite, CollateralRatio::Finite(_)) => Ordering::Greater,
            (CollateralRatio::Infinite, CollateralRatio::Infinite) => Ordering::Equal,
        }
    }
}

impl fmt::Display for CollateralRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollateralRatio::Finite(r) => write!(f, "{}", r),
            CollateralRatio::Infinite => f.write_str("inf"),
        }
    }
}

/// Read-only view of pool totals returned by `pool_state()`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub total_shares: u128,
    pub total_borrowed: u128,
    pub total_collateral: u128,
    pub pool_asset_balance: u128,
    pub exchange_rate: Wad,
    pub accrual_index: Wad,
    pub last_accrual_time: u64,
    pub collateral_price: Wad,
    pub price_observed_at: u64,
    pub bad_debt: u128,
    pub stranded_payments: u128,
    pub accrual_count: u64,
    pub accounts: usize,
}
