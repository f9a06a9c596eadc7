//! Collateralized lending ledger
//!
//! A single-pool lending engine: depositors supply a base asset and receive
//! claim-shares whose value grows with accrued interest; borrowers post a
//! volatile collateral asset and draw base-asset debt against it, subject to
//! a minimum collateralization ratio; liquidators close out accounts whose
//! ratio falls below the threshold.
//!
//! The engine guarantees:
//! 1. Every operation is all-or-nothing: an error leaves the ledger untouched
//! 2. Interest accrues in O(1) through a global index, never by iterating accounts
//! 3. No borrow or withdrawal can leave the acting account below the threshold
//! 4. Redemptions never drain the pool below outstanding debt
//! 5. Re-entrant calls from a collaborator are rejected
//!
//! Token movement and pricing are delegated to the [`AssetTransfer`] and
//! [`PriceSource`] traits; [`sim`] provides in-memory implementations.

#![forbid(unsafe_code)]

pub mod accrual;
mod borrow;
mod collateral;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod liquidation;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod shared;
pub mod shares;
pub mod sim;
pub mod state;
pub mod transfer;

pub use accrual::AccrualStep;
pub use config::{PoolConfig, PoolParams};
pub use error::{LedgerError, Result, TransferError};
pub use events::LedgerEvent;
pub use guard::EntryLock;
pub use liquidation::LiquidationOutcome;
pub use math::{Wad, BPS, WAD};
pub use oracle::{PriceObservation, PriceOracleAdapter, PriceSource};
pub use pool::LendingPool;
pub use shared::SharedPool;
pub use state::{Account, AccountId, CollateralRatio, PoolSnapshot, PoolState};
pub use transfer::{Asset, AssetTransfer};
