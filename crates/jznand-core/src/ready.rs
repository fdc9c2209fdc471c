//! Ready/busy detection
//!
//! A chip either has its R/B# pin wired to a GPIO, in which case the line is
//! polled, or it has none and the NAND core waits a fixed delay after each
//! command. The choice is made once, when the chip is initialized.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hw::{GpioInput, GpioOutput};

/// Command delay when there is no R/B pin, in microseconds
pub const RB_DELAY_US: u32 = 100;

/// How a chip reports completion of internal operations
pub enum ReadyDetector {
    /// Poll the R/B# line
    GpioPolling {
        /// The requested input line
        line: Box<dyn GpioInput>,
        /// Polarity captured when the line was requested
        active_low: bool,
    },
    /// Wait unconditionally after each command
    FixedDelay {
        /// Delay in microseconds
        microseconds: u32,
    },
}

impl ReadyDetector {
    /// Pick the detector for a chip: the GPIO if one was supplied, the fixed
    /// delay otherwise
    pub fn new(line: Option<Box<dyn GpioInput>>) -> Self {
        match line {
            Some(line) => {
                let active_low = line.is_active_low();
                ReadyDetector::GpioPolling { line, active_low }
            }
            None => ReadyDetector::FixedDelay {
                microseconds: RB_DELAY_US,
            },
        }
    }

    /// Whether a ready line can be polled
    pub fn can_poll(&self) -> bool {
        matches!(self, ReadyDetector::GpioPolling { .. })
    }

    /// Poll the ready line
    ///
    /// Returns `None` for chips without one; the caller must use
    /// [`delay`](Self::delay) instead.
    pub fn is_ready(&mut self) -> Result<Option<bool>> {
        match self {
            ReadyDetector::GpioPolling { line, active_low } => {
                let value = line.get().map_err(|source| Error::Gpio { name: "rb", source })?;
                Ok(Some(value != *active_low))
            }
            ReadyDetector::FixedDelay { .. } => Ok(None),
        }
    }

    /// Command delay the NAND core should use
    pub fn chip_delay_us(&self) -> u32 {
        match self {
            ReadyDetector::FixedDelay { microseconds } => *microseconds,
            ReadyDetector::GpioPolling { .. } => RB_DELAY_US,
        }
    }

    /// Block for the chip delay
    pub fn delay(&self) {
        thread::sleep(Duration::from_micros(self.chip_delay_us() as u64));
    }
}

impl core::fmt::Debug for ReadyDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadyDetector::GpioPolling { active_low, .. } => f
                .debug_struct("GpioPolling")
                .field("active_low", active_low)
                .finish(),
            ReadyDetector::FixedDelay { microseconds } => f
                .debug_struct("FixedDelay")
                .field("microseconds", microseconds)
                .finish(),
        }
    }
}

/// Write-protect output of a chip
pub struct WriteProtect {
    line: Box<dyn GpioOutput>,
    active_low: bool,
}

impl core::fmt::Debug for WriteProtect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WriteProtect")
            .field("active_low", &self.active_low)
            .finish()
    }
}

impl WriteProtect {
    /// Wrap a line that was requested deasserted
    pub fn new(line: Box<dyn GpioOutput>) -> Self {
        let active_low = line.is_active_low();
        Self { line, active_low }
    }

    /// Assert (`true`) or release write protection
    pub fn set(&mut self, protect: bool) -> Result<()> {
        self.line
            .set(protect != self.active_low)
            .map_err(|source| Error::Gpio { name: "wp", source })
    }

    /// Polarity of the line
    pub fn is_active_low(&self) -> bool {
        self.active_low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Line {
        value: Arc<AtomicBool>,
        active_low: bool,
    }

    impl GpioInput for Line {
        fn get(&mut self) -> core::result::Result<bool, BoxError> {
            Ok(self.value.load(Ordering::SeqCst))
        }
        fn is_active_low(&self) -> bool {
            self.active_low
        }
    }

    impl GpioOutput for Line {
        fn set(&mut self, high: bool) -> core::result::Result<(), BoxError> {
            self.value.store(high, Ordering::SeqCst);
            Ok(())
        }
        fn is_active_low(&self) -> bool {
            self.active_low
        }
    }

    fn line(value: bool, active_low: bool) -> (Arc<AtomicBool>, Box<Line>) {
        let shared = Arc::new(AtomicBool::new(value));
        let line = Box::new(Line {
            value: shared.clone(),
            active_low,
        });
        (shared, line)
    }

    #[test]
    fn test_fixed_delay_without_gpio() {
        let mut ready = ReadyDetector::new(None);
        assert!(!ready.can_poll());
        assert_eq!(ready.chip_delay_us(), RB_DELAY_US);
        assert_eq!(ready.is_ready().unwrap(), None);
    }

    #[test]
    fn test_gpio_ready_differs_from_active_low() {
        for raw in [false, true] {
            for active_low in [false, true] {
                let (_, l) = line(raw, active_low);
                let mut ready = ReadyDetector::new(Some(l as Box<dyn GpioInput>));
                assert!(ready.can_poll());
                assert_eq!(ready.is_ready().unwrap(), Some(raw != active_low));
            }
        }
    }

    #[test]
    fn test_polarity_flip_inverts() {
        let (_, high) = line(true, false);
        let (_, high_low) = line(true, true);
        let a = ReadyDetector::new(Some(high as Box<dyn GpioInput>)).is_ready().unwrap();
        let b = ReadyDetector::new(Some(high_low as Box<dyn GpioInput>)).is_ready().unwrap();
        assert_eq!(a, Some(true));
        assert_eq!(b, Some(false));
    }

    #[test]
    fn test_gpio_follows_line() {
        let (value, l) = line(false, false);
        let mut ready = ReadyDetector::new(Some(l as Box<dyn GpioInput>));
        assert_eq!(ready.is_ready().unwrap(), Some(false));
        value.store(true, Ordering::SeqCst);
        assert_eq!(ready.is_ready().unwrap(), Some(true));
    }

    #[test]
    fn test_write_protect_polarity() {
        let (value, l) = line(false, true);
        let mut wp = WriteProtect::new(l);
        wp.set(true).unwrap();
        assert!(!value.load(Ordering::SeqCst));
        wp.set(false).unwrap();
        assert!(value.load(Ordering::SeqCst));

        let (value, l) = line(false, false);
        let mut wp = WriteProtect::new(l);
        wp.set(true).unwrap();
        assert!(value.load(Ordering::SeqCst));
    }
}
