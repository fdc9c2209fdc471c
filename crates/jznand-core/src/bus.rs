//! Bus arbitration
//!
//! All chips of a controller share one command/address/data bus, so at most
//! one of them may be selected at any instant.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Mutual exclusion over the shared bus, keyed by chip id
#[derive(Debug, Default)]
pub struct BusLock {
    owner: Mutex<Option<usize>>,
    released: Condvar,
}

impl BusLock {
    /// A free bus
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Option<usize>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the bus for `chip`, waiting while another chip holds it
    ///
    /// Claiming a bus the chip already holds returns immediately.
    pub fn acquire(&self, chip: usize) {
        let mut owner = self.state();
        while let Some(current) = *owner {
            if current == chip {
                return;
            }
            owner = self
                .released
                .wait(owner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *owner = Some(chip);
    }

    /// Give the bus back
    ///
    /// Only the holder can release; returns false otherwise.
    pub fn release(&self, chip: usize) -> bool {
        let mut owner = self.state();
        if *owner != Some(chip) {
            return false;
        }
        *owner = None;
        drop(owner);
        self.released.notify_all();
        true
    }

    /// Chip currently holding the bus
    pub fn owner(&self) -> Option<usize> {
        *self.state()
    }
}
