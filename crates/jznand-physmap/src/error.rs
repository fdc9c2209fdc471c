//! Error types for physical memory access

use thiserror::Error;

/// Physmap backend errors
#[derive(Debug, Error)]
pub enum PhysmapError {
    /// /dev/mem could not be opened
    #[error("failed to open /dev/mem: {0}")]
    DevMem(#[source] std::io::Error),

    /// mmap() of the region failed
    #[error("failed to map {size:#x} bytes at {address:#x}: {source}")]
    MemoryMap {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// Bank window cannot hold the DATA, COMMAND and ADDRESS sub-windows
    #[error("window at {address:#x} is {size:#x} bytes, needs at least {min:#x}")]
    WindowTooSmall {
        address: u64,
        size: usize,
        min: usize,
    },

    /// Bank number outside the NEMC
    #[error("bank {bank} out of range (1..={num_banks})")]
    InvalidBank { bank: u32, num_banks: usize },

    /// The board description lacks a required value
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Operation not supported on this platform
    #[error("{0}")]
    NotSupported(&'static str),
}

/// Result type for physmap operations
pub type Result<T> = std::result::Result<T, PhysmapError>;
