//! jznand-dummy - In-memory NEMC and NAND emulator for testing
//!
//! Emulates everything around the controller: a recording NEMC, one NAND
//! chip per mapped bank, GPIO lines, a stand-in BCH engine and a minimal
//! NAND core. Useful for testing and development without real hardware.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use jznand_core::{ChipDecl, Controller};
//! use jznand_dummy::{DummyConfig, DummyNandCore, DummyPlatform, EngineSetup};
//!
//! let mut platform = DummyPlatform::new(DummyConfig::default(), EngineSetup::Absent);
//! let nemc = Arc::new(platform.nemc(6));
//! let decls = [ChipDecl { bank: Some(1), base: 0x1b00_0000, ..Default::default() }];
//! let controller = Controller::probe(nemc, &mut platform, &mut DummyNandCore::new(), &decls)?;
//! assert_eq!(controller.chips().len(), 1);
//! # Ok::<(), jznand_core::Error>(())
//! ```

pub mod engine;
pub mod error;
pub mod flash;
pub mod gpio;
pub mod nand;
pub mod nemc;
pub mod platform;

pub use engine::{DummyEccEngine, EngineStats};
pub use error::DummyError;
pub use flash::{DummyConfig, DummyFlash};
pub use gpio::DummyGpio;
pub use nand::DummyNandCore;
pub use nemc::{DummyNemc, Event, EventLog};
pub use platform::{DummyPlatform, EngineSetup};
