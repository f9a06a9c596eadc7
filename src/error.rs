//! Error taxonomy for ledger operations
//!
//! Every error aborts the operation that produced it and leaves the ledger
//! exactly as it was before the call.

use crate::transfer::Asset;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Caller lacks the collateral or shares for the requested amount
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Pool cannot honor the borrow or redemption
    #[error("insufficient pool liquidity")]
    InsufficientLiquidity,

    /// Borrow would leave the account below the collateral ratio threshold
    #[error("insufficient collateral for requested borrow")]
    InsufficientCollateral,

    /// Withdrawal would leave the account below the collateral ratio threshold
    #[error("withdrawal would leave account undercollateralized")]
    Undercollateralized,

    /// Liquidation attempted on an account with no debt or a healthy ratio
    #[error("account is not liquidatable")]
    NotLiquidatable,

    /// Oracle data absent, zero, or older than the staleness bound
    #[error("collateral price is stale or unavailable")]
    StalePrice,

    /// External asset movement failed
    #[error("asset transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// Mutating operation invoked while another is in progress
    #[error("re-entrant call rejected")]
    Reentrant,

    /// Zero amount, or an amount the operation cannot accept (e.g. overpaying debt)
    #[error("invalid amount")]
    InvalidAmount,

    /// Checked arithmetic failed
    #[error("arithmetic overflow")]
    Overflow,

    /// Pool parameters rejected at construction
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by the asset transfer collaborator
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("insufficient {asset} funds: needed {needed}, available {available}")]
    InsufficientFunds {
        asset: Asset,
        needed: u128,
        available: u128,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = core::result::Result<T, LedgerError>;
