//! jznand-core - NAND controller coordination for JZ4780-style NEMC boards
//!
//! This crate sits between a generic NAND core and the hardware of a NEMC
//! with several chip-select banks and an optional shared BCH controller.
//!
//! # Overview
//!
//! - [`bank`] maps sparse bank ids to dense chip indices
//! - [`window`] multiplexes command/address/data cycles onto a bank window
//! - [`ready`] picks between polling the R/B# line and a fixed delay
//! - [`ecc`] computes ECC sizes and OOB layout and dispatches to the engine
//! - [`controller`] brings up the chips and owns the shared resources
//!
//! Hardware is reached only through the traits in [`hw`], so the same code
//! drives real registers (`jznand-physmap`, `jznand-linux-gpio`) and the
//! in-memory emulator (`jznand-dummy`).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jznand_core::{BoardConfig, Controller};
//!
//! let board = BoardConfig::from_toml_file("board.toml")?;
//! let controller = Controller::probe(nemc, &mut platform, &mut core, &board.chip)?;
//! for chip in controller.chips() {
//!     println!("bank {}: {:?}", chip.bank(), chip.geometry());
//! }
//! ```

#![warn(missing_docs)]

pub mod bank;
pub mod bus;
pub mod chip;
pub mod config;
pub mod controller;
pub mod ecc;
pub mod error;
pub mod hw;
pub mod ready;
pub mod window;

pub use bank::{BankMap, BankSlot};
pub use chip::{Chip, ChipHost, NandGeometry};
pub use config::{BoardConfig, ChipDecl, EccSettings, GpioSpec};
pub use controller::Controller;
pub use ecc::{EccAccess, EccConfig, EccLayout, EccMode, EccParams, EccStatus};
pub use error::{BoxError, Error, Result};
pub use hw::{BankType, EccEngine, GpioInput, GpioOutput, MmioWindow, NandCore, Nemc, Platform};
pub use ready::{ReadyDetector, WriteProtect};
pub use window::{CtrlFlags, Window};
