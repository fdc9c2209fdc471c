//! Emulated board resources

use std::collections::BTreeMap;
use std::sync::Arc;

use jznand_core::{
    BankSlot, BoardConfig, ChipDecl, EccEngine, Error, GpioInput, GpioOutput, MmioWindow,
    Platform, Result,
};

use crate::engine::{DummyEccEngine, EngineStats};
use crate::error::DummyError;
use crate::flash::{DummyConfig, DummyFlash};
use crate::gpio::DummyGpio;
use crate::nemc::{DummyNemc, EventLog};

/// Availability of the BCH controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineSetup {
    /// The board has none
    #[default]
    Absent,
    /// Described, but cannot be obtained
    Unavailable,
    /// Present
    Available,
}

/// Board resources backed by emulated hardware
pub struct DummyPlatform {
    flash: DummyConfig,
    log: Arc<EventLog>,
    engine: EngineSetup,
    stats: Arc<EngineStats>,
    windows: BTreeMap<u32, Arc<DummyFlash>>,
    busy: BTreeMap<usize, DummyGpio>,
    wp: BTreeMap<usize, DummyGpio>,
    fail_map_bank: Option<u32>,
}

impl DummyPlatform {
    /// A board whose chips all report `flash`
    pub fn new(flash: DummyConfig, engine: EngineSetup) -> Self {
        Self {
            flash,
            log: EventLog::new(),
            engine,
            stats: EngineStats::new(),
            windows: BTreeMap::new(),
            busy: BTreeMap::new(),
            wp: BTreeMap::new(),
            fail_map_bank: None,
        }
    }

    /// Platform for a parsed board description
    ///
    /// The engine is available when `[ecc_engine]` names the `dummy` kind.
    pub fn from_board(board: &BoardConfig) -> std::result::Result<Self, DummyError> {
        let engine = match &board.ecc_engine {
            None => EngineSetup::Absent,
            Some(e) if e.kind == "dummy" => EngineSetup::Available,
            Some(e) => return Err(DummyError::UnknownEngine(e.kind.clone())),
        };
        Ok(Self::new(DummyConfig::default(), engine))
    }

    /// A NEMC sharing this platform's event log
    pub fn nemc(&self, num_banks: usize) -> DummyNemc {
        DummyNemc::new(num_banks, self.log.clone())
    }

    /// Make mapping the window of `bank` fail
    pub fn fail_map(mut self, bank: u32) -> Self {
        self.fail_map_bank = Some(bank);
        self
    }

    /// Bus event log
    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// BCH engine counters
    pub fn engine_stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    /// Banks whose window was mapped, in bank order
    pub fn mapped_banks(&self) -> Vec<u32> {
        self.windows.keys().copied().collect()
    }

    /// Ready/busy line handed to chip `index`
    pub fn busy_gpio(&self, index: usize) -> Option<&DummyGpio> {
        self.busy.get(&index)
    }

    /// Write-protect line handed to chip `index`
    pub fn wp_gpio(&self, index: usize) -> Option<&DummyGpio> {
        self.wp.get(&index)
    }
}

impl Platform for DummyPlatform {
    fn map_window(&mut self, slot: &BankSlot) -> Result<Arc<dyn MmioWindow>> {
        if self.fail_map_bank == Some(slot.bank) {
            return Err(Error::MapFailed {
                bank: slot.bank,
                base: slot.base,
                source: Box::new(DummyError::MapRefused(slot.bank)),
            });
        }

        let flash = Arc::new(DummyFlash::new(slot.bank, self.flash, self.log.clone()));
        self.windows.insert(slot.bank, flash.clone());
        Ok(flash as Arc<dyn MmioWindow>)
    }

    fn busy_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioInput>>> {
        Ok(decl.rb_gpio.as_ref().map(|spec| {
            // level that reads as ready
            let line = DummyGpio::new(!spec.active_low, spec.active_low);
            self.busy.insert(index, line.clone());
            Box::new(line) as Box<dyn GpioInput>
        }))
    }

    fn wp_line(&mut self, index: usize, decl: &ChipDecl) -> Result<Option<Box<dyn GpioOutput>>> {
        Ok(decl.wp_gpio.as_ref().map(|spec| {
            // deasserted
            let line = DummyGpio::new(spec.active_low, spec.active_low);
            self.wp.insert(index, line.clone());
            Box::new(line) as Box<dyn GpioOutput>
        }))
    }

    fn acquire_ecc_engine(&mut self) -> Result<Box<dyn EccEngine>> {
        match self.engine {
            EngineSetup::Absent => {
                log::error!("no bch controller configured");
                Err(Error::EngineNotConfigured)
            }
            EngineSetup::Unavailable => Err(Error::EngineUnavailable(Box::new(
                DummyError::EngineBusy,
            ))),
            EngineSetup::Available => Ok(Box::new(DummyEccEngine::acquire(self.stats.clone()))),
        }
    }
}
