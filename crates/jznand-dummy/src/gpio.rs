//! Emulated GPIO lines

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jznand_core::{BoxError, GpioInput, GpioOutput};

/// A GPIO line whose physical level is shared with the test
#[derive(Debug, Clone)]
pub struct DummyGpio {
    level: Arc<AtomicBool>,
    active_low: bool,
}

impl DummyGpio {
    /// A line at physical `level`
    pub fn new(level: bool, active_low: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
            active_low,
        }
    }

    /// Current physical level
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Drive the physical level from outside
    pub fn drive(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }
}

impl GpioInput for DummyGpio {
    fn get(&mut self) -> Result<bool, BoxError> {
        Ok(self.level())
    }

    fn is_active_low(&self) -> bool {
        self.active_low
    }
}

impl GpioOutput for DummyGpio {
    fn set(&mut self, high: bool) -> Result<(), BoxError> {
        self.drive(high);
        Ok(())
    }

    fn is_active_low(&self) -> bool {
        self.active_low
    }
}
