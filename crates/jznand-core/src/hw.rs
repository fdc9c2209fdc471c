//! Hardware and collaborator traits
//!
//! The core never touches hardware directly. Everything it needs is reached
//! through these traits, implemented by the backend crates
//! (`jznand-physmap`, `jznand-linux-gpio`) or by the in-memory emulator in
//! `jznand-dummy`.

use std::sync::Arc;

use crate::bank::BankSlot;
use crate::chip::{ChipHost, NandGeometry};
use crate::config::ChipDecl;
use crate::ecc::{EccParams, EccStatus};
use crate::error::{BoxError, Result};

/// Bus mode of a NEMC bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankType {
    /// Plain SRAM-style access
    Sram,
    /// NAND flash access
    Nand,
}

/// The external memory controller owning the chip-select lines
pub trait Nemc: Send + Sync {
    /// Number of banks wired to this controller
    fn num_banks(&self) -> usize;

    /// Configure the bus mode of a bank
    fn set_bank_type(&self, bank: u32, kind: BankType);

    /// Assert (`true`) or deassert the chip-select line of a bank
    fn assert_bank(&self, bank: u32, assert: bool);
}

/// A memory-mapped bank window
pub trait MmioWindow: Send + Sync {
    /// Read a byte at `offset` from the window base
    fn read8(&self, offset: usize) -> u8;

    /// Write a byte at `offset` from the window base
    fn write8(&self, offset: usize, value: u8);
}

/// A GPIO input line
pub trait GpioInput: Send {
    /// Read the raw (physical) line value
    ///
    /// May sleep.
    fn get(&mut self) -> core::result::Result<bool, BoxError>;

    /// Whether the line is described as active-low
    fn is_active_low(&self) -> bool;
}

/// A GPIO output line
pub trait GpioOutput: Send {
    /// Drive the raw (physical) line value
    fn set(&mut self, high: bool) -> core::result::Result<(), BoxError>;

    /// Whether the line is described as active-low
    fn is_active_low(&self) -> bool;
}

/// A BCH correction accelerator
///
/// Dropping the engine object gives the accelerator back to its owner, so
/// holding the only box is the same as holding the reference.
pub trait EccEngine: Send + Sync {
    /// Compute the ECC bytes of one chunk
    fn calculate(
        &self,
        params: &EccParams,
        data: &[u8],
        ecc_code: &mut [u8],
    ) -> core::result::Result<(), BoxError>;

    /// Check and correct one chunk in place
    fn correct(
        &self,
        params: &EccParams,
        data: &mut [u8],
        read_ecc: &[u8],
    ) -> core::result::Result<EccStatus, BoxError>;
}

/// Platform resources consumed during chip initialization
pub trait Platform {
    /// Map the I/O window of a bank
    fn map_window(&mut self, slot: &BankSlot) -> Result<Arc<dyn MmioWindow>>;

    /// Request the optional ready/busy input of a chip
    fn busy_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioInput>>>;

    /// Request the optional write-protect output of a chip
    ///
    /// The line must come up driven low (write protection deasserted).
    fn wp_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioOutput>>>;

    /// Resolve the BCH controller
    ///
    /// Fails with `EngineNotConfigured` when the board has none and
    /// `EngineUnavailable` when it exists but cannot be obtained.
    fn acquire_ecc_engine(&mut self) -> Result<Box<dyn EccEngine>>;
}

/// The generic NAND core that sequences commands on top of a chip
pub trait NandCore {
    /// Identify the device and report its page geometry
    fn identify(&mut self, host: &mut ChipHost<'_>) -> core::result::Result<NandGeometry, BoxError>;

    /// Finish the scan once the ECC setup is known
    fn finish_scan(&mut self, host: &mut ChipHost<'_>) -> core::result::Result<(), BoxError>;
}
