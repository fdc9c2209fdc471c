//! jznand-linux-gpio - NAND control lines over Linux GPIO
//!
//! Provides the optional R/B# input and WP# output of a chip using the Linux
//! GPIO character device interface (gpiocdev).
//!
//! # Example
//!
//! ```no_run
//! use jznand_core::{GpioInput, GpioSpec};
//! use jznand_linux_gpio::busy_line;
//!
//! let spec = GpioSpec {
//!     chip: "/dev/gpiochip0".into(),
//!     line: 20,
//!     active_low: true,
//! };
//! let mut rb = busy_line(&spec)?;
//! println!("raw R/B#: {}", rb.get().map_err(|e| e.to_string())?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (5.5+ for the v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod error;
pub mod line;

use jznand_core::{GpioInput, GpioOutput, GpioSpec};

pub use error::{LinuxGpioError, Result};
pub use line::{LinuxGpioInput, LinuxGpioOutput};

/// Request a ready/busy input
pub fn busy_line(spec: &GpioSpec) -> jznand_core::Result<Box<dyn GpioInput>> {
    match LinuxGpioInput::open(spec) {
        Ok(line) => Ok(Box::new(line)),
        Err(e) => Err(jznand_core::Error::Gpio {
            name: "rb",
            source: Box::new(e),
        }),
    }
}

/// Request a write-protect output, deasserted
pub fn wp_line(spec: &GpioSpec) -> jznand_core::Result<Box<dyn GpioOutput>> {
    match LinuxGpioOutput::open(spec) {
        Ok(line) => Ok(Box::new(line)),
        Err(e) => Err(jznand_core::Error::Gpio {
            name: "wp",
            source: Box::new(e),
        }),
    }
}
