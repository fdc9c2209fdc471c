//! Single-line GPIO requests
//!
//! Lines are requested without the kernel's active-low flag, so every value
//! read or written is the physical level. Polarity is applied by the core.

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use jznand_core::{BoxError, GpioInput, GpioOutput, GpioSpec};

use crate::error::{LinuxGpioError, Result};

/// Consumer label shown by gpioinfo
pub const CONSUMER: &str = "jznand";

fn level(value: Value) -> bool {
    value == Value::Active
}

fn value(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

fn request(spec: &GpioSpec, config: Config) -> Result<Request> {
    if spec.chip.is_empty() {
        return Err(LinuxGpioError::NoDevice(spec.line));
    }

    Request::from_config(config)
        .on_chip(&spec.chip)
        .with_consumer(CONSUMER)
        .request()
        .map_err(|source| LinuxGpioError::LineRequestFailed {
            chip: spec.chip.clone(),
            line: spec.line,
            source,
        })
}

/// An input line, used for R/B#
pub struct LinuxGpioInput {
    request: Request,
    offset: Offset,
    active_low: bool,
}

impl LinuxGpioInput {
    /// Request `spec` as an input
    pub fn open(spec: &GpioSpec) -> Result<Self> {
        let mut config = Config::default();
        config.with_line(spec.line).as_input();
        let request = request(spec, config)?;

        log::debug!(
            "linux_gpio: input {}:{}{}",
            spec.chip,
            spec.line,
            if spec.active_low { " (active low)" } else { "" }
        );

        Ok(Self {
            request,
            offset: spec.line,
            active_low: spec.active_low,
        })
    }
}

impl GpioInput for LinuxGpioInput {
    fn get(&mut self) -> std::result::Result<bool, BoxError> {
        self.request
            .value(self.offset)
            .map(level)
            .map_err(|e| LinuxGpioError::GetValueFailed(e).into())
    }

    fn is_active_low(&self) -> bool {
        self.active_low
    }
}

/// An output line, used for WP#
pub struct LinuxGpioOutput {
    request: Request,
    offset: Offset,
    active_low: bool,
}

impl LinuxGpioOutput {
    /// Request `spec` as an output, driven to its inactive level
    pub fn open(spec: &GpioSpec) -> Result<Self> {
        let mut config = Config::default();
        config
            .with_line(spec.line)
            .as_output(value(spec.active_low));
        let request = request(spec, config)?;

        log::debug!(
            "linux_gpio: output {}:{}{}",
            spec.chip,
            spec.line,
            if spec.active_low { " (active low)" } else { "" }
        );

        Ok(Self {
            request,
            offset: spec.line,
            active_low: spec.active_low,
        })
    }
}

impl GpioOutput for LinuxGpioOutput {
    fn set(&mut self, high: bool) -> std::result::Result<(), BoxError> {
        self.request
            .set_value(self.offset, value(high))
            .map(|_| ())
            .map_err(|e| LinuxGpioError::SetValueFailed(e).into())
    }

    fn is_active_low(&self) -> bool {
        self.active_low
    }
}
