//! Error types for jznand-core
//!
//! Every failure of the controller bring-up sequence is reported through
//! [`Error`]. Failures of external collaborators (the NAND core, platform
//! resource lookup, GPIO backends, the BCH engine) are carried as boxed
//! sources and passed through unchanged.

use thiserror::Error;

/// Boxed error from an external collaborator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    // Bank mapping errors
    /// More chips were declared than the NEMC has banks
    #[error("found {declared} chips but only {num_banks} banks")]
    CapacityExceeded {
        /// Number of chip declarations
        declared: usize,
        /// Bank capacity of the controller
        num_banks: usize,
    },
    /// A chip declaration does not name its bank
    #[error("chip declaration {index} has no bank id")]
    MissingBankId {
        /// Position of the declaration
        index: usize,
    },
    /// A bank window too small to hold the ADDRESS sub-window
    #[error("bank {bank} window of {size:#x} bytes is smaller than {min:#x}")]
    WindowTooSmall {
        /// Bank id
        bank: u32,
        /// Declared window size
        size: usize,
        /// Smallest usable window
        min: usize,
    },
    /// Two chip declarations name the same bank
    #[error("bank {bank} is declared more than once")]
    DuplicateBankId {
        /// The repeated bank id
        bank: u32,
    },
    /// The NEMC reports no banks at all
    #[error("no banks found")]
    NoBanks,

    // Protocol misuse
    /// `control()` was called while no chip is selected
    #[error("no chip selected")]
    NoChipSelected,
    /// A chip-select slot index is out of range
    #[error("chip select {index} out of range ({count} slots)")]
    NoSuchChipSelect {
        /// Requested slot index
        index: usize,
        /// Number of mapped slots
        count: usize,
    },

    // ECC engine resolution
    /// Hardware ECC requested but no BCH controller is configured
    #[error("no bch controller configured")]
    EngineNotConfigured,
    /// The configured BCH controller could not be obtained
    #[error("bch controller unavailable: {0}")]
    EngineUnavailable(#[source] BoxError),
    /// The BCH engine failed while computing or checking a codeword
    #[error("bch engine error: {0}")]
    Engine(#[source] BoxError),
    /// An ECC entry point was used on a chip that is not in hardware mode
    #[error("chip is not using hardware ECC")]
    EccNotHardware,

    // Geometry
    /// The ECC bytes of a page do not fit the OOB area
    #[error("ECC layout needs {total_ecc_bytes} bytes plus 2 reserved, OOB has {oob_size}")]
    LayoutOverflow {
        /// ECC bytes needed for a whole page
        total_ecc_bytes: u32,
        /// OOB size of the page
        oob_size: u32,
    },
    /// ECC parameters that cannot describe a code
    #[error("invalid ECC configuration: {0}")]
    InvalidEccConfig(&'static str),

    // Resource acquisition
    /// The bank window could not be mapped
    #[error("failed to map window of bank {bank} at {base:#x}: {source}")]
    MapFailed {
        /// Bank id
        bank: u32,
        /// Physical base address
        base: u64,
        /// Backend error
        #[source]
        source: BoxError,
    },
    /// A GPIO line could not be requested or accessed
    #[error("failed to request {name} GPIO: {source}")]
    Gpio {
        /// Line function ("rb" or "wp")
        name: &'static str,
        /// Backend error
        #[source]
        source: BoxError,
    },

    // External NAND core
    /// Device identification failed
    #[error("NAND identify failed: {0}")]
    IdentifyFailed(#[source] BoxError),
    /// Finishing the device scan failed
    #[error("NAND scan failed: {0}")]
    ScanFailed(#[source] BoxError),

    // Lifecycle
    /// `init_chips()` was called on a controller that already ran it
    #[error("controller chips already initialized")]
    AlreadyInitialized,

    // Configuration
    /// Board description could not be read
    #[error("failed to read board file {path}: {source}")]
    ConfigRead {
        /// File that was opened
        path: std::path::PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },
    /// Board description is not valid TOML or has invalid values
    #[error("invalid board configuration: {0}")]
    Config(#[source] toml::de::Error),
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
