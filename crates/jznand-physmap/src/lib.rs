//! jznand-physmap - memory-mapped NEMC and bank windows
//!
//! Maps the NEMC register block and the NAND bank windows through /dev/mem,
//! for running the controller from user space on the SoC itself.
//!
//! Requires root.

pub mod error;
pub mod nemc;
pub mod physmap;

use std::sync::Arc;

use jznand_core::bank::MIN_WINDOW_SIZE;
use jznand_core::{BankSlot, MmioWindow};

pub use error::{PhysmapError, Result};
pub use nemc::PhysNemc;
pub use physmap::PhysMap;

/// Map the window of a bank
///
/// Windows that end before the ADDRESS sub-window are refused before
/// /dev/mem is opened.
pub fn map_bank(slot: &BankSlot) -> jznand_core::Result<Arc<dyn MmioWindow>> {
    let mapped = if slot.size < MIN_WINDOW_SIZE {
        Err(PhysmapError::WindowTooSmall {
            address: slot.base,
            size: slot.size,
            min: MIN_WINDOW_SIZE,
        })
    } else {
        PhysMap::new(slot.base, slot.size)
    };

    match mapped {
        Ok(map) => Ok(Arc::new(map)),
        Err(e) => Err(jznand_core::Error::MapFailed {
            bank: slot.bank,
            base: slot.base,
            source: Box::new(e),
        }),
    }
}
