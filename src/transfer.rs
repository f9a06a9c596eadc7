//! Asset transfer collaborator
//!
//! The ledger never moves tokens itself. Every movement of the base asset or
//! the collateral asset is requested through [`AssetTransfer`], and the
//! ledger only commits its own bookkeeping after the request succeeded.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::state::AccountId;

/// The two assets the pool custodies
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Stable asset supplied by depositors and drawn by borrowers
    Base,
    /// Volatile asset posted to secure debt
    Collateral,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Base => f.write_str("base"),
            Asset::Collateral => f.write_str("collateral"),
        }
    }
}

/// Trait for pluggable asset movement
///
/// Implementers execute the actual token transfers between account holders
/// and the pool. Each method is called at most once per asset and direction
/// within a single ledger operation.
///
/// # Re-entrancy
/// An implementation may call back into the ledger (e.g. a transfer hook).
/// Such calls are rejected with `Reentrant` while the outer operation holds
/// its entry guard.
pub trait AssetTransfer {
    /// Move `amount` of `asset` from `from` into the pool
    fn transfer_in(
        &mut self,
        asset: Asset,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Move `amount` of `asset` from the pool to `to`
    fn transfer_out(
        &mut self,
        asset: Asset,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Amount of `asset` currently held by the pool
    fn balance_of(&self, asset: Asset) -> u128;
}
