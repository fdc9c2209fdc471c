//! Controller lifecycle
//!
//! A [`Controller`] is attached to a NEMC, then brings up every declared chip
//! in order:
//!
//! 1. switch the bank to NAND mode
//! 2. map the bank window
//! 3. request the ready/busy and write-protect lines
//! 4. identify the device through the NAND core
//! 5. set up ECC, acquiring the shared BCH controller on first use
//! 6. let the NAND core finish its scan
//! 7. register the chip
//!
//! Steps 4 to 6 may leave the chip selected; it is deselected and the bus
//! freed before the chip is registered or dropped.
//!
//! The first failure stops the sequence. Chips registered before it stay
//! registered; the bank windows mapped so far stay mapped.

use std::sync::Arc;

use crate::bank::{BankMap, BankSlot};
use crate::bus::BusLock;
use crate::chip::{Chip, ChipHost, NandGeometry, Shared};
use crate::config::ChipDecl;
use crate::ecc::{EccConfig, EccEngineHandle};
use crate::error::{Error, Result};
use crate::hw::{BankType, Nemc, NandCore, Platform};
use crate::ready::{ReadyDetector, WriteProtect};
use crate::window::ChipSelect;

/// A NEMC with the NAND chips behind it
pub struct Controller {
    nemc: Arc<dyn Nemc>,
    num_banks: usize,
    selects: Vec<ChipSelect>,
    ecc: EccEngineHandle,
    chips: Vec<Chip>,
    bus: BusLock,
    initialized: bool,
}

impl Controller {
    /// Attach to a NEMC
    ///
    /// Fails with [`Error::NoBanks`] if the NEMC reports no banks.
    pub fn attach(nemc: Arc<dyn Nemc>) -> Result<Self> {
        let num_banks = nemc.num_banks();
        if num_banks == 0 {
            log::error!("no banks found");
            return Err(Error::NoBanks);
        }
        log::debug!("nemc with {} banks", num_banks);

        Ok(Self {
            nemc,
            num_banks,
            selects: Vec::new(),
            ecc: EccEngineHandle::new(),
            chips: Vec::new(),
            bus: BusLock::new(),
            initialized: false,
        })
    }

    /// Attach and bring up all declared chips
    pub fn probe(
        nemc: Arc<dyn Nemc>,
        platform: &mut dyn Platform,
        core: &mut dyn NandCore,
        decls: &[ChipDecl],
    ) -> Result<Self> {
        let mut controller = Self::attach(nemc)?;
        controller.init_chips(platform, core, decls)?;
        Ok(controller)
    }

    /// Bring up the declared chips
    ///
    /// Can run once per controller, even if the first run failed.
    pub fn init_chips(
        &mut self,
        platform: &mut dyn Platform,
        core: &mut dyn NandCore,
        decls: &[ChipDecl],
    ) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.initialized = true;

        let map = BankMap::new(self.num_banks, decls)
            .inspect_err(|e| log::error!("invalid chip declarations: {}", e))?;

        for (index, (slot, decl)) in map.slots().iter().zip(decls).enumerate() {
            self.init_chip(platform, core, index, *slot, decl)
                .inspect_err(|e| {
                    log::error!("failed to init chip {} (bank {}): {}", index, slot.bank, e)
                })?;
        }

        Ok(())
    }

    fn init_chip(
        &mut self,
        platform: &mut dyn Platform,
        core: &mut dyn NandCore,
        index: usize,
        slot: BankSlot,
        decl: &ChipDecl,
    ) -> Result<()> {
        self.nemc.set_bank_type(slot.bank, BankType::Nand);

        let io = platform.map_window(&slot)?;
        log::debug!(
            "bank {}: window {:#x}+{:#x} mapped",
            slot.bank,
            slot.base,
            slot.size
        );
        self.selects.push(ChipSelect::new(slot, io));

        let ready = ReadyDetector::new(platform.busy_line(index, decl)?);
        let wp = platform.wp_line(index, decl)?.map(WriteProtect::new);
        let mut chip = Chip::new(
            self.chips.len(),
            slot.bank,
            ready,
            wp,
            EccConfig::new(&decl.ecc),
        );

        let result = self.bring_up(platform, core, &mut chip);
        self.park(&mut chip);
        let geometry = result?;

        log::info!(
            "chip {}: bank {}, {}+{} byte pages",
            chip.id(),
            slot.bank,
            geometry.page_data_size,
            geometry.oob_size
        );
        self.chips.push(chip);
        Ok(())
    }

    /// Identify, set up ECC and finish the scan of a chip
    fn bring_up(
        &mut self,
        platform: &mut dyn Platform,
        core: &mut dyn NandCore,
        chip: &mut Chip,
    ) -> Result<NandGeometry> {
        let geometry = core
            .identify(&mut self.host_for(chip))
            .map_err(Error::IdentifyFailed)?;
        chip.geometry = Some(geometry);

        let acquired = self.init_ecc(platform, chip, &geometry)?;

        let scanned = core.finish_scan(&mut self.host_for(chip));
        if let Err(e) = scanned {
            if acquired {
                self.ecc.release();
            }
            return Err(Error::ScanFailed(e));
        }

        Ok(geometry)
    }

    /// Deselect a chip the NAND core left selected and free the bus
    fn park(&self, chip: &mut Chip) {
        if chip.window.unbind(&*self.nemc) {
            log::warn!("chip {}: left selected by the NAND core", chip.id());
        }
        self.bus.release(chip.id());
    }

    /// Set up ECC for a chip; returns whether the engine was acquired here
    fn init_ecc(
        &mut self,
        platform: &mut dyn Platform,
        chip: &mut Chip,
        geometry: &NandGeometry,
    ) -> Result<bool> {
        chip.ecc.validate()?;

        let acquired = if chip.ecc.is_hardware() {
            self.ecc.acquire_with(|| platform.acquire_ecc_engine())?
        } else {
            false
        };

        chip.ecc.log_summary();

        if let Err(e) = chip.ecc.derive_layout(geometry) {
            if acquired {
                self.ecc.release();
            }
            return Err(e);
        }

        Ok(acquired)
    }

    fn host_for<'a>(&'a self, chip: &'a mut Chip) -> ChipHost<'a> {
        ChipHost::new(
            chip,
            Shared {
                nemc: &*self.nemc,
                selects: &self.selects,
                ecc: self.ecc.get(),
                bus: &self.bus,
            },
        )
    }

    /// Bank capacity of the NEMC
    pub fn num_banks(&self) -> usize {
        self.num_banks
    }

    /// Mapped chip-select slots, in chip index order
    pub fn bank_slots(&self) -> impl Iterator<Item = &BankSlot> {
        self.selects.iter().map(|cs| &cs.slot)
    }

    /// Registered chips
    pub fn chips(&self) -> &[Chip] {
        &self.chips
    }

    /// Chip currently holding the bus
    pub fn bus_owner(&self) -> Option<usize> {
        self.bus.owner()
    }

    /// Whether the BCH controller is held
    pub fn ecc_engine_acquired(&self) -> bool {
        self.ecc.is_acquired()
    }

    /// Host for one registered chip
    pub fn host(&mut self, index: usize) -> Option<ChipHost<'_>> {
        let shared = Shared {
            nemc: &*self.nemc,
            selects: &self.selects,
            ecc: self.ecc.get(),
            bus: &self.bus,
        };
        self.chips
            .get_mut(index)
            .map(|chip| ChipHost::new(chip, shared))
    }

    /// One host per registered chip
    ///
    /// Hosts can be moved to different threads; selection is serialized by
    /// the bus lock.
    pub fn hosts(&mut self) -> Vec<ChipHost<'_>> {
        let shared = Shared {
            nemc: &*self.nemc,
            selects: &self.selects,
            ecc: self.ecc.get(),
            bus: &self.bus,
        };
        self.chips
            .iter_mut()
            .map(|chip| ChipHost::new(chip, shared))
            .collect()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if self.ecc.release() {
            log::debug!("controller detached");
        }
    }
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("num_banks", &self.num_banks)
            .field("selects", &self.selects)
            .field("ecc", &self.ecc)
            .field("chips", &self.chips)
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::hw::{EccEngine, GpioInput, GpioOutput, MmioWindow};

    struct Banks(usize);

    impl Nemc for Banks {
        fn num_banks(&self) -> usize {
            self.0
        }
        fn set_bank_type(&self, _bank: u32, _kind: BankType) {}
        fn assert_bank(&self, _bank: u32, _assert: bool) {}
    }

    struct Null;

    impl MmioWindow for Null {
        fn read8(&self, _offset: usize) -> u8 {
            0
        }
        fn write8(&self, _offset: usize, _value: u8) {}
    }

    struct Board;

    impl Platform for Board {
        fn map_window(&mut self, _slot: &BankSlot) -> Result<Arc<dyn MmioWindow>> {
            Ok(Arc::new(Null))
        }
        fn busy_line(
            &mut self,
            _index: usize,
            _decl: &ChipDecl,
        ) -> Result<Option<Box<dyn GpioInput>>> {
            Ok(None)
        }
        fn wp_line(
            &mut self,
            _index: usize,
            _decl: &ChipDecl,
        ) -> Result<Option<Box<dyn GpioOutput>>> {
            Ok(None)
        }
        fn acquire_ecc_engine(&mut self) -> Result<Box<dyn EccEngine>> {
            Err(Error::EngineNotConfigured)
        }
    }

    struct Core;

    impl NandCore for Core {
        fn identify(
            &mut self,
            _host: &mut ChipHost<'_>,
        ) -> core::result::Result<NandGeometry, BoxError> {
            Ok(NandGeometry {
                page_data_size: 2048,
                oob_size: 64,
            })
        }
        fn finish_scan(&mut self, _host: &mut ChipHost<'_>) -> core::result::Result<(), BoxError> {
            Ok(())
        }
    }

    fn decl(bank: u32) -> ChipDecl {
        ChipDecl {
            bank: Some(bank),
            base: 0x1b00_0000,
            ..Default::default()
        }
    }

    #[test]
    fn test_attach_without_banks() {
        assert!(matches!(
            Controller::attach(Arc::new(Banks(0))),
            Err(Error::NoBanks)
        ));
    }

    #[test]
    fn test_init_once() {
        let mut controller = Controller::attach(Arc::new(Banks(6))).unwrap();
        controller
            .init_chips(&mut Board, &mut Core, &[decl(1), decl(3)])
            .unwrap();
        assert_eq!(controller.chips().len(), 2);
        assert_eq!(
            controller.bank_slots().map(|s| s.bank).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(matches!(
            controller.init_chips(&mut Board, &mut Core, &[decl(2)]),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_bad_declarations_touch_nothing() {
        let mut controller = Controller::attach(Arc::new(Banks(1))).unwrap();
        assert!(matches!(
            controller.init_chips(&mut Board, &mut Core, &[decl(1), decl(2)]),
            Err(Error::CapacityExceeded {
                declared: 2,
                num_banks: 1
            })
        ));
        assert_eq!(controller.bank_slots().count(), 0);
        assert!(controller.chips().is_empty());
    }

    #[test]
    fn test_hardware_ecc_without_engine() {
        let mut hw = decl(1);
        hw.ecc.mode = crate::ecc::EccMode::Hardware;
        hw.ecc.step_size = 512;
        hw.ecc.strength = 8;

        let err = Controller::probe(Arc::new(Banks(6)), &mut Board, &mut Core, &[hw]).unwrap_err();
        assert!(matches!(err, Error::EngineNotConfigured));
    }
}
