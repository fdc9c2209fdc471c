//! Recording NEMC
//!
//! Bank configuration, chip-select changes and window accesses of every
//! emulated bank go into one [`EventLog`], so tests can check their relative
//! order.

use std::sync::{Arc, Mutex, PoisonError};

use jznand_core::{BankType, Nemc, Window};

/// Something that happened on the emulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Bank switched to a bus mode
    SetType { bank: u32, kind: BankType },
    /// Chip-select line driven
    Assert { bank: u32, assert: bool },
    /// Byte written to a sub-window
    Write { bank: u32, window: Window, value: u8 },
    /// Byte read from the DATA sub-window
    Read { bank: u32, value: u8 },
}

/// Shared, ordered event record
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    /// An empty log
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append an event
    pub fn push(&self, event: Event) {
        log::trace!("dummy: {:?}", event);
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Chip-select transitions only
    pub fn asserts(&self) -> Vec<(u32, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Assert { bank, assert } => Some((bank, assert)),
                _ => None,
            })
            .collect()
    }
}

/// NEMC emulator
pub struct DummyNemc {
    num_banks: usize,
    log: Arc<EventLog>,
    asserted: Mutex<Vec<u32>>,
}

impl DummyNemc {
    /// A NEMC with `num_banks` banks recording into `log`
    pub fn new(num_banks: usize, log: Arc<EventLog>) -> Self {
        Self {
            num_banks,
            log,
            asserted: Mutex::new(Vec::new()),
        }
    }

    /// Banks whose chip-select line is currently asserted
    pub fn asserted_banks(&self) -> Vec<u32> {
        self.asserted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Nemc for DummyNemc {
    fn num_banks(&self) -> usize {
        self.num_banks
    }

    fn set_bank_type(&self, bank: u32, kind: BankType) {
        self.log.push(Event::SetType { bank, kind });
    }

    fn assert_bank(&self, bank: u32, assert: bool) {
        let mut asserted = self
            .asserted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        asserted.retain(|&b| b != bank);
        if assert {
            asserted.push(bank);
        }
        self.log.push(Event::Assert { bank, assert });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_asserted_banks() {
        let log = EventLog::new();
        let nemc = DummyNemc::new(6, log.clone());

        nemc.assert_bank(1, true);
        nemc.assert_bank(3, true);
        nemc.assert_bank(1, false);
        assert_eq!(nemc.asserted_banks(), vec![3]);
        assert_eq!(log.asserts(), vec![(1, true), (3, true), (1, false)]);

        log.clear();
        assert!(log.events().is_empty());
    }
}
