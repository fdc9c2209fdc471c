//! Bank enumeration
//!
//! The banks assigned to the NAND controller need not be consecutive, but
//! the NAND core expects consecutive chip numbers. [`BankMap`] fills out a
//! dense array mapping chip index to the actual bank.

use crate::config::ChipDecl;
use crate::error::{Error, Result};
use crate::window::OFFSET_ADDR;

/// Default size of a bank window (covers DATA, COMMAND and ADDRESS)
pub const DEFAULT_WINDOW_SIZE: usize = 0x0100_0000;

/// Smallest window that still reaches the ADDRESS sub-window
pub const MIN_WINDOW_SIZE: usize = OFFSET_ADDR + 1;

/// One chip-select slot: a bank id and the physical window behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSlot {
    /// NEMC bank number
    pub bank: u32,
    /// Physical base address of the bank window
    pub base: u64,
    /// Size of the bank window in bytes
    pub size: usize,
}

/// Dense chip index -> bank mapping
#[derive(Debug, Clone)]
pub struct BankMap {
    num_banks: usize,
    slots: Vec<BankSlot>,
}

impl BankMap {
    /// Build the mapping for `decls`, in declaration order
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if there are more declarations than `num_banks`
    /// - `MissingBankId` if a declaration has no bank id
    /// - `DuplicateBankId` if a bank id is declared twice
    /// - `WindowTooSmall` if a window ends before the ADDRESS sub-window
    pub fn new(num_banks: usize, decls: &[ChipDecl]) -> Result<Self> {
        if decls.len() > num_banks {
            return Err(Error::CapacityExceeded {
                declared: decls.len(),
                num_banks,
            });
        }

        let mut slots: Vec<BankSlot> = Vec::with_capacity(decls.len());
        for (index, decl) in decls.iter().enumerate() {
            let bank = decl.bank.ok_or(Error::MissingBankId { index })?;
            if slots.iter().any(|s| s.bank == bank) {
                return Err(Error::DuplicateBankId { bank });
            }
            if decl.size < MIN_WINDOW_SIZE {
                return Err(Error::WindowTooSmall {
                    bank,
                    size: decl.size,
                    min: MIN_WINDOW_SIZE,
                });
            }

            log::debug!("chip {} -> bank {} at {:#x}", index, bank, decl.base);
            slots.push(BankSlot {
                bank,
                base: decl.base,
                size: decl.size,
            });
        }

        Ok(Self { num_banks, slots })
    }

    /// Bank capacity of the controller
    pub fn num_banks(&self) -> usize {
        self.num_banks
    }

    /// Number of mapped chips
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no chip was declared
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot for chip `index`
    pub fn get(&self, index: usize) -> Option<&BankSlot> {
        self.slots.get(index)
    }

    /// All slots, in chip index order
    pub fn slots(&self) -> &[BankSlot] {
        &self.slots
    }

    /// Chip index serving `bank`
    pub fn index_of(&self, bank: u32) -> Option<usize> {
        self.slots.iter().position(|s| s.bank == bank)
    }
}
