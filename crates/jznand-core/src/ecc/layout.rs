//! OOB layout for hardware ECC
//!
//! ECC codes are right aligned in the OOB area, so the first two bytes
//! (bad block marker) and everything between them and the codes stay free.

use crate::chip::NandGeometry;
use crate::error::{Error, Result};

/// Bytes at the start of the OOB area reserved for the bad block marker
pub const OOB_RESERVED: u32 = 2;

/// A free region of the OOB area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OobFree {
    /// First free byte
    pub offset: u32,
    /// Number of free bytes
    pub length: u32,
}

/// Placement of ECC bytes in the OOB area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EccLayout {
    /// ECC bytes for a whole page
    pub total_ecc_bytes: u32,
    /// OOB offset of each ECC byte, in order
    pub ecc_byte_positions: Vec<u32>,
    /// The one free region
    pub free_region: OobFree,
}

impl EccLayout {
    /// Pack the ECC bytes of every chunk of a page at the tail of the OOB
    pub fn right_aligned(geometry: &NandGeometry, chunk_size: u32, ecc_bytes: u32) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidEccConfig("ECC step size is zero"));
        }

        let oob_size = geometry.oob_size;
        let steps = geometry.page_data_size / chunk_size;
        let total_ecc_bytes = steps
            .checked_mul(ecc_bytes)
            .ok_or(Error::InvalidEccConfig("ECC bytes per page overflow"))?;

        if total_ecc_bytes.saturating_add(OOB_RESERVED) > oob_size {
            return Err(Error::LayoutOverflow {
                total_ecc_bytes,
                oob_size,
            });
        }

        let start = oob_size - total_ecc_bytes;
        Ok(Self {
            total_ecc_bytes,
            ecc_byte_positions: (start..oob_size).collect(),
            free_region: OobFree {
                offset: OOB_RESERVED,
                length: oob_size - total_ecc_bytes - OOB_RESERVED,
            },
        })
    }

    /// First OOB byte used for ECC
    pub fn ecc_region_start(&self) -> Option<u32> {
        self.ecc_byte_positions.first().copied()
    }
}
