//! Error types for the emulator

use thiserror::Error;

/// Emulator errors
#[derive(Debug, Error)]
pub enum DummyError {
    /// Injected identify failure
    #[error("chip {0}: identify failed (injected)")]
    IdentifyFailed(usize),

    /// Injected scan failure
    #[error("chip {0}: scan failed (injected)")]
    ScanFailed(usize),

    /// Injected mapping failure
    #[error("bank {0}: window refused")]
    MapRefused(u32),

    /// The engine exists but is held elsewhere
    #[error("bch engine busy")]
    EngineBusy,

    /// Board names an engine kind the emulator does not provide
    #[error("unknown ecc engine kind '{0}'")]
    UnknownEngine(String),

    /// READ ID returned bytes no chip would
    #[error("no NAND device found (id {0:02x?})")]
    NoDevice([u8; 4]),

    /// The chip never became ready
    #[error("chip {0}: timeout waiting for ready")]
    Timeout(usize),

    /// Hardware ECC chip finished without a layout
    #[error("chip {0}: hardware ECC without a layout")]
    MissingLayout(usize),

    /// Core protocol error
    #[error(transparent)]
    Core(#[from] jznand_core::Error),
}
