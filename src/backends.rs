//! Backend registry and controller bring-up
//!
//! A backend supplies everything around the controller: the NEMC, bank
//! windows, control lines and the BCH engine. Which backends exist depends
//! on the enabled cargo features.

#[cfg(any(feature = "dummy", feature = "physmap"))]
use std::sync::Arc;

use jznand_core::{BoardConfig, Controller};
use thiserror::Error;

/// Number of banks assumed when the board file does not say
#[allow(dead_code)]
const DEFAULT_NUM_BANKS: usize = 6;

/// Information about a backend
pub struct BackendInfo {
    /// Name used on the command line
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Backend selection errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend with this name is built in
    #[error("unknown backend '{name}'\n\n{help}")]
    Unknown {
        /// Requested name
        name: String,
        /// List of the available backends
        help: String,
    },
    /// The board file lacks a value the backend needs
    #[error("board file does not set {0}")]
    MissingConfig(&'static str),
}

/// Get list of all available backends based on enabled features
pub fn available_backends() -> Vec<BackendInfo> {
    #[allow(unused_mut)]
    let mut backends = Vec::new();

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory NEMC and NAND emulator for testing",
    });

    #[cfg(feature = "physmap")]
    backends.push(BackendInfo {
        name: "physmap",
        aliases: &["devmem"],
        description: "NEMC registers and bank windows through /dev/mem (requires root)",
    });

    backends
}

/// Resolve a name or alias to the backend name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

fn unknown_backend_error(name: &str) -> BackendError {
    let mut help = String::from("Available backends:\n");
    for backend in available_backends() {
        help.push_str(&format!("  {:<10} - {}\n", backend.name, backend.description));
    }
    if available_backends().is_empty() {
        help.push_str("  (none, rebuild with a backend feature enabled)\n");
    }
    BackendError::Unknown {
        name: name.to_string(),
        help,
    }
}

/// Bring up a controller for `board` on the named backend
pub fn open_controller(
    name: &str,
    board: &BoardConfig,
) -> Result<Controller, Box<dyn std::error::Error>> {
    let backend = find_backend(name).ok_or_else(|| unknown_backend_error(name))?;
    log::debug!("using backend {}", backend);

    match backend {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(board),
        #[cfg(feature = "physmap")]
        "physmap" => open_physmap(board),
        _ => {
            let _ = board;
            Err(unknown_backend_error(name).into())
        }
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(board: &BoardConfig) -> Result<Controller, Box<dyn std::error::Error>> {
    use jznand_dummy::{DummyNandCore, DummyPlatform};

    let mut platform = DummyPlatform::from_board(board)?;
    let nemc = Arc::new(platform.nemc(board.controller.num_banks.unwrap_or(DEFAULT_NUM_BANKS)));
    let controller = Controller::probe(nemc, &mut platform, &mut DummyNandCore::new(), &board.chip)?;
    Ok(controller)
}

#[cfg(feature = "physmap")]
fn open_physmap(board: &BoardConfig) -> Result<Controller, Box<dyn std::error::Error>> {
    use jznand_dummy::DummyNandCore;
    use jznand_physmap::PhysNemc;

    let base = board
        .controller
        .nemc_base
        .ok_or(BackendError::MissingConfig("controller.nemc_base"))?;
    let num_banks = board.controller.num_banks.unwrap_or(DEFAULT_NUM_BANKS);
    let nemc = Arc::new(PhysNemc::new(base, num_banks)?);

    let mut platform = physmap::PhysPlatform::new(board);
    let controller = Controller::probe(nemc, &mut platform, &mut DummyNandCore::new(), &board.chip)?;
    Ok(controller)
}

#[cfg(feature = "physmap")]
mod physmap {
    use std::sync::Arc;

    use jznand_core::{
        BankSlot, BoardConfig, ChipDecl, EccEngine, Error, GpioInput, GpioOutput, MmioWindow,
        Platform, Result,
    };

    /// Board resources on the SoC itself
    pub struct PhysPlatform<'a> {
        board: &'a BoardConfig,
    }

    impl<'a> PhysPlatform<'a> {
        pub fn new(board: &'a BoardConfig) -> Self {
            Self { board }
        }
    }

    impl Platform for PhysPlatform<'_> {
        fn map_window(&mut self, slot: &BankSlot) -> Result<Arc<dyn MmioWindow>> {
            jznand_physmap::map_bank(slot)
        }

        #[cfg(feature = "linux-gpio")]
        fn busy_line(&mut self, _index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioInput>>> {
            decl.rb_gpio
                .as_ref()
                .map(jznand_linux_gpio::busy_line)
                .transpose()
        }

        #[cfg(not(feature = "linux-gpio"))]
        fn busy_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioInput>>> {
            if decl.rb_gpio.is_some() {
                log::warn!("chip {}: rb_gpio ignored, built without linux-gpio", index);
            }
            Ok(None)
        }

        #[cfg(feature = "linux-gpio")]
        fn wp_line(&mut self, _index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioOutput>>> {
            decl.wp_gpio
                .as_ref()
                .map(jznand_linux_gpio::wp_line)
                .transpose()
        }

        #[cfg(not(feature = "linux-gpio"))]
        fn wp_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioOutput>>> {
            if decl.wp_gpio.is_some() {
                log::warn!("chip {}: wp_gpio ignored, built without linux-gpio", index);
            }
            Ok(None)
        }

        fn acquire_ecc_engine(&mut self) -> Result<Box<dyn EccEngine>> {
            match &self.board.ecc_engine {
                None => {
                    log::error!("no bch controller configured");
                    Err(Error::EngineNotConfigured)
                }
                Some(engine) => Err(Error::EngineUnavailable(
                    format!("no driver for bch controller '{}'", engine.kind).into(),
                )),
            }
        }
    }
}
