//! NEMC register access
//!
//! Only the NAND flash control/status register is touched. Each bank `n`
//! (1-based) owns three bits in it: NAND enable, chip enable and toggle NAND
//! enable.

use std::sync::{Mutex, PoisonError};

use jznand_core::{BankType, Nemc};

use crate::error::{PhysmapError, Result};
use crate::physmap::PhysMap;

/// NAND flash control/status register
pub const NEMC_NFCSR: usize = 0x50;

/// Size of the register block to map
pub const NEMC_REGS_SIZE: usize = 0x100;

/// Banks on a JZ4780 NEMC
pub const NEMC_MAX_BANKS: usize = 6;

/// NAND enable bit of bank `n`
pub const fn nfcsr_nfe(bank: u32) -> u32 {
    1 << ((bank - 1) * 2)
}

/// Chip enable bit of bank `n`
pub const fn nfcsr_nfce(bank: u32) -> u32 {
    1 << ((bank - 1) * 2 + 1)
}

/// Toggle NAND enable bit of bank `n`
pub const fn nfcsr_tnfe(bank: u32) -> u32 {
    1 << (16 + bank - 1)
}

/// NFCSR value after switching `bank` to `kind`
pub fn nfcsr_with_type(nfcsr: u32, bank: u32, kind: BankType) -> u32 {
    match kind {
        BankType::Nand => (nfcsr & !nfcsr_tnfe(bank)) | nfcsr_nfe(bank),
        BankType::Sram => nfcsr & !(nfcsr_tnfe(bank) | nfcsr_nfe(bank)),
    }
}

/// NFCSR value after driving the chip enable of `bank`
pub fn nfcsr_with_assert(nfcsr: u32, bank: u32, assert: bool) -> u32 {
    if assert {
        nfcsr | nfcsr_nfce(bank)
    } else {
        nfcsr & !nfcsr_nfce(bank)
    }
}

/// A NEMC reached through /dev/mem
pub struct PhysNemc {
    regs: PhysMap,
    num_banks: usize,
    /// Serializes read-modify-write cycles on NFCSR
    lock: Mutex<()>,
}

impl PhysNemc {
    /// Map the register block at `base`
    pub fn new(base: u64, num_banks: usize) -> Result<Self> {
        if num_banks > NEMC_MAX_BANKS {
            return Err(PhysmapError::InvalidBank {
                bank: num_banks as u32,
                num_banks: NEMC_MAX_BANKS,
            });
        }

        let regs = PhysMap::new(base, NEMC_REGS_SIZE)?;
        log::info!("nemc at {:#x}, {} banks", base, num_banks);
        Ok(Self {
            regs,
            num_banks,
            lock: Mutex::new(()),
        })
    }

    fn check_bank(&self, bank: u32) -> Result<()> {
        if bank == 0 || bank as usize > self.num_banks {
            return Err(PhysmapError::InvalidBank {
                bank,
                num_banks: self.num_banks,
            });
        }
        Ok(())
    }

    fn update(&self, bank: u32, f: impl FnOnce(u32) -> u32) {
        if let Err(e) = self.check_bank(bank) {
            log::warn!("nemc: {}", e);
            return;
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let nfcsr = self.regs.read32(NEMC_NFCSR);
        self.regs.write32(NEMC_NFCSR, f(nfcsr));
    }
}

impl Nemc for PhysNemc {
    fn num_banks(&self) -> usize {
        self.num_banks
    }

    fn set_bank_type(&self, bank: u32, kind: BankType) {
        log::debug!("nemc: bank {} -> {:?}", bank, kind);
        self.update(bank, |v| nfcsr_with_type(v, bank, kind));
    }

    fn assert_bank(&self, bank: u32, assert: bool) {
        self.update(bank, |v| nfcsr_with_assert(v, bank, assert));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_bits() {
        assert_eq!(nfcsr_nfe(1), 0x0000_0001);
        assert_eq!(nfcsr_nfce(1), 0x0000_0002);
        assert_eq!(nfcsr_tnfe(1), 0x0001_0000);
        assert_eq!(nfcsr_nfe(6), 0x0000_0400);
        assert_eq!(nfcsr_nfce(6), 0x0000_0800);
        assert_eq!(nfcsr_tnfe(6), 0x0020_0000);
    }

    #[test]
    fn test_set_type() {
        // toggle mode cleared, NAND enabled
        let v = nfcsr_with_type(nfcsr_tnfe(2), 2, BankType::Nand);
        assert_eq!(v, nfcsr_nfe(2));
        assert_eq!(nfcsr_with_type(v, 2, BankType::Sram), 0);
        // other banks untouched
        let other = nfcsr_nfe(1) | nfcsr_nfce(1);
        assert_eq!(nfcsr_with_type(other, 3, BankType::Nand), other | nfcsr_nfe(3));
    }

    #[test]
    fn test_assert() {
        let v = nfcsr_with_assert(nfcsr_nfe(1), 1, true);
        assert_eq!(v, nfcsr_nfe(1) | nfcsr_nfce(1));
        assert_eq!(nfcsr_with_assert(v, 1, false), nfcsr_nfe(1));
        assert_eq!(nfcsr_with_assert(0, 4, false), 0);
    }
}
