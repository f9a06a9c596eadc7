//! In-progress flag guarding mutating operations against re-entry

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{LedgerError, Result};

/// Shared flag set for the full duration of a mutating operation
///
/// Clones observe the same flag, so a handle given to a front end or a
/// collaborator hook sees the operation in progress.
#[derive(Clone, Debug, Default)]
pub struct EntryLock(Rc<Cell<bool>>);

impl EntryLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.0.get()
    }

    /// Acquire the flag, or `Reentrant` if an operation is already running
    pub fn enter(&self) -> Result<EntryGuard> {
        if self.0.get() {
            log::warn!("guard: re-entrant call rejected");
            return Err(LedgerError::Reentrant);
        }
        self.0.set(true);
        Ok(EntryGuard(Rc::clone(&self.0)))
    }
}

/// Releases the flag on drop, including on early error returns
#[derive(Debug)]
pub struct EntryGuard(Rc<Cell<bool>>);

impl Drop for EntryGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
