//! BCH engine parameters and the controller-owned engine handle

use crate::error::Result;
use crate::hw::EccEngine;

/// Code parameters forwarded to the engine with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EccParams {
    /// Data bytes per chunk
    pub size: u32,
    /// ECC bytes per chunk
    pub bytes: u32,
    /// Correctable bits per chunk
    pub strength: u32,
}

/// Outcome of a correction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccStatus {
    /// The chunk is good; the number of flipped bits that were fixed
    Corrected(usize),
    /// Too many bit errors to recover the chunk
    Uncorrectable,
}

/// Direction of the page access the next ECC calls belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EccAccess {
    /// Page read
    Read,
    /// Page program
    Write,
}

/// The BCH controller shared by all hardware-ECC chips of one controller
///
/// Acquired at most once, by the first chip that needs it. The handle is
/// owned by the controller alone; releasing takes the engine out, so a
/// second release is a no-op.
#[derive(Default)]
pub struct EccEngineHandle {
    engine: Option<Box<dyn EccEngine>>,
}

impl EccEngineHandle {
    /// An empty handle
    pub fn new() -> Self {
        Self { engine: None }
    }

    /// Whether an engine is held
    pub fn is_acquired(&self) -> bool {
        self.engine.is_some()
    }

    /// Acquire the engine through `acquire` unless one is already held
    ///
    /// Returns true if this call did the acquisition. On failure nothing is
    /// stored.
    pub fn acquire_with<F>(&mut self, acquire: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Box<dyn EccEngine>>,
    {
        if self.engine.is_some() {
            return Ok(false);
        }

        let engine = acquire()?;
        log::debug!("bch controller acquired");
        self.engine = Some(engine);
        Ok(true)
    }

    /// The held engine
    pub fn get(&self) -> Option<&dyn EccEngine> {
        self.engine.as_deref()
    }

    /// Give the engine back
    ///
    /// Returns false if nothing was held.
    pub fn release(&mut self) -> bool {
        match self.engine.take() {
            Some(engine) => {
                drop(engine);
                log::debug!("bch controller released");
                true
            }
            None => false,
        }
    }
}

impl Drop for EccEngineHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for EccEngineHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EccEngineHandle")
            .field("acquired", &self.is_acquired())
            .finish()
    }
}
