//! Per-chip state and the host interface handed to the NAND core

use crate::bus::BusLock;
use crate::ecc::{EccAccess, EccConfig, EccStatus};
use crate::error::{Error, Result};
use crate::hw::{EccEngine, Nemc};
use crate::ready::{ReadyDetector, WriteProtect};
use crate::window::{ChipSelect, ChipWindow, CtrlFlags, Window};

/// Page geometry reported by device identification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NandGeometry {
    /// Data bytes per page
    pub page_data_size: u32,
    /// Spare (OOB) bytes per page
    pub oob_size: u32,
}

impl NandGeometry {
    /// ECC steps in a page for a chunk size
    pub fn steps(&self, chunk_size: u32) -> u32 {
        if chunk_size == 0 {
            0
        } else {
            self.page_data_size / chunk_size
        }
    }
}

/// One NAND chip behind the controller
#[derive(Debug)]
pub struct Chip {
    id: usize,
    bank: u32,
    pub(crate) window: ChipWindow,
    pub(crate) ready: ReadyDetector,
    pub(crate) wp: Option<WriteProtect>,
    pub(crate) ecc: EccConfig,
    pub(crate) geometry: Option<NandGeometry>,
    reading: bool,
}

impl Chip {
    pub(crate) fn new(
        id: usize,
        bank: u32,
        ready: ReadyDetector,
        wp: Option<WriteProtect>,
        ecc: EccConfig,
    ) -> Self {
        Self {
            id,
            bank,
            window: ChipWindow::new(),
            ready,
            wp,
            ecc,
            geometry: None,
            reading: false,
        }
    }

    /// Registration index, which is also the index of the chip's own
    /// chip-select slot
    pub fn id(&self) -> usize {
        self.id
    }

    /// Bank the chip was declared on
    pub fn bank(&self) -> u32 {
        self.bank
    }

    /// ECC configuration
    pub fn ecc(&self) -> &EccConfig {
        &self.ecc
    }

    /// Page geometry, once identified
    pub fn geometry(&self) -> Option<NandGeometry> {
        self.geometry
    }

    /// Whether the chip has a ready/busy line
    pub fn has_ready_line(&self) -> bool {
        self.ready.can_poll()
    }

    /// Whether the chip has a write-protect line
    pub fn has_write_protect(&self) -> bool {
        self.wp.is_some()
    }

    /// Chip-select slot the chip is bound to
    pub fn selected(&self) -> Option<usize> {
        self.window.selected()
    }

    /// Whether the last ECC access was a read
    pub fn is_reading(&self) -> bool {
        self.reading
    }
}

/// Controller state shared by all hosts
#[derive(Clone, Copy)]
pub(crate) struct Shared<'a> {
    pub(crate) nemc: &'a dyn Nemc,
    pub(crate) selects: &'a [ChipSelect],
    pub(crate) ecc: Option<&'a dyn EccEngine>,
    pub(crate) bus: &'a BusLock,
}

/// Access to one chip on behalf of the NAND core
///
/// Every primitive the core uses to talk to the chip goes through here:
/// selection, control lines, data transfer, ready detection and ECC.
pub struct ChipHost<'a> {
    chip: &'a mut Chip,
    shared: Shared<'a>,
}

impl<'a> ChipHost<'a> {
    pub(crate) fn new(chip: &'a mut Chip, shared: Shared<'a>) -> Self {
        Self { chip, shared }
    }

    /// The chip driven by this host
    pub fn chip(&self) -> &Chip {
        self.chip
    }

    /// Select chip-select slot `index`, or deselect with `None`
    ///
    /// Selecting takes the bus and blocks while another chip holds it.
    /// Moving to another slot deasserts the previous one first. Deselecting
    /// deasserts the line and frees the bus; it does nothing when no slot is
    /// selected.
    pub fn select(&mut self, target: Option<usize>) -> Result<()> {
        let Some(index) = target else {
            if self.chip.window.unbind(self.shared.nemc) {
                self.shared.bus.release(self.chip.id);
            }
            return Ok(());
        };

        let cs = self
            .shared
            .selects
            .get(index)
            .ok_or(Error::NoSuchChipSelect {
                index,
                count: self.shared.selects.len(),
            })?;

        match self.chip.window.selected() {
            None => self.shared.bus.acquire(self.chip.id),
            Some(current) if current != index => {
                self.chip.window.unbind(self.shared.nemc);
            }
            Some(_) => {}
        }

        log::trace!("chip {}: select slot {} (bank {})", self.chip.id, index, cs.slot.bank);
        self.chip.window.bind(index, cs);
        Ok(())
    }

    /// Drive the control lines and optionally latch a command/address byte
    pub fn control(&mut self, cmd: Option<u8>, ctrl: CtrlFlags) -> Result<()> {
        self.chip
            .window
            .control(self.shared.nemc, cmd, ctrl)
            .inspect_err(|_| log::warn!("chip {}: control without a selected chip", self.chip.id))
    }

    /// Read one data byte
    pub fn read_byte(&mut self) -> Result<u8> {
        self.chip.window.read_byte()
    }

    /// Write one byte to the active sub-window
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.chip.window.write_byte(byte)
    }

    /// Read a buffer of data bytes
    pub fn read_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        self.chip.window.read_buf(buf)
    }

    /// Write a buffer to the active sub-window
    pub fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.chip.window.write_buf(buf)
    }

    /// Sub-window byte writes currently go to
    pub fn active_window(&self) -> Window {
        self.chip.window.active_window()
    }

    /// Poll the ready line; `None` when the chip has none
    pub fn is_ready(&mut self) -> Result<Option<bool>> {
        self.chip.ready.is_ready()
    }

    /// Command delay for chips without a ready line
    pub fn chip_delay_us(&self) -> u32 {
        self.chip.ready.chip_delay_us()
    }

    /// Sleep for the command delay
    pub fn delay(&self) {
        self.chip.ready.delay()
    }

    /// Assert or release write protection
    ///
    /// Chips without a write-protect line accept and ignore the request.
    pub fn set_write_protect(&mut self, protect: bool) -> Result<()> {
        match self.chip.wp.as_mut() {
            Some(wp) => wp.set(protect),
            None => {
                log::debug!("chip {}: no wp line", self.chip.id);
                Ok(())
            }
        }
    }

    /// Record the direction of the page access that follows
    pub fn ecc_hwctl(&mut self, access: EccAccess) {
        self.chip.reading = access == EccAccess::Read;
    }

    /// Compute the ECC bytes of a chunk; 0 during a read pass
    pub fn ecc_calculate(&mut self, data: &[u8], ecc_code: &mut [u8]) -> Result<usize> {
        self.chip
            .ecc
            .calculate(self.shared.ecc, self.chip.reading, data, ecc_code)
    }

    /// Check and correct a chunk in place
    pub fn ecc_correct(&mut self, data: &mut [u8], read_ecc: &[u8]) -> Result<EccStatus> {
        self.chip.ecc.correct(self.shared.ecc, data, read_ecc)
    }

    /// ECC configuration of the chip
    pub fn ecc(&self) -> &EccConfig {
        &self.chip.ecc
    }

    /// Page geometry, once identified
    pub fn geometry(&self) -> Option<NandGeometry> {
        self.chip.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::BankSlot;
    use crate::config::EccSettings;
    use crate::error::BoxError;
    use crate::hw::{BankType, GpioInput, MmioWindow};
    use crate::window::OFFSET_CMD;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Assert(u32, bool),
        Write(u32, usize, u8),
    }

    #[derive(Default)]
    struct Log(Mutex<Vec<Event>>);

    impl Nemc for Log {
        fn num_banks(&self) -> usize {
            6
        }
        fn set_bank_type(&self, _bank: u32, _kind: BankType) {}
        fn assert_bank(&self, bank: u32, assert: bool) {
            self.0.lock().unwrap().push(Event::Assert(bank, assert));
        }
    }

    struct Io {
        bank: u32,
        log: Arc<Log>,
    }

    impl MmioWindow for Io {
        fn read8(&self, _offset: usize) -> u8 {
            0xA5
        }
        fn write8(&self, offset: usize, value: u8) {
            self.log
                .0
                .lock()
                .unwrap()
                .push(Event::Write(self.bank, offset, value));
        }
    }

    struct Fixture {
        log: Arc<Log>,
        selects: Vec<ChipSelect>,
        bus: BusLock,
    }

    impl Fixture {
        fn new(banks: &[u32]) -> Self {
            let log = Arc::new(Log::default());
            let selects = banks
                .iter()
                .map(|&bank| {
                    let slot = BankSlot {
                        bank,
                        base: 0x1b00_0000,
                        size: 0x0100_0000,
                    };
                    let io: Arc<dyn MmioWindow> = Arc::new(Io {
                        bank,
                        log: log.clone(),
                    });
                    ChipSelect::new(slot, io)
                })
                .collect();
            Self {
                log,
                selects,
                bus: BusLock::new(),
            }
        }

        fn shared(&self) -> Shared<'_> {
            Shared {
                nemc: &*self.log,
                selects: &self.selects,
                ecc: None,
                bus: &self.bus,
            }
        }

        fn events(&self) -> Vec<Event> {
            self.log.0.lock().unwrap().clone()
        }
    }

    fn chip(line: Option<Box<dyn GpioInput>>) -> Chip {
        Chip::new(
            0,
            1,
            ReadyDetector::new(line),
            None,
            EccConfig::new(&EccSettings::default()),
        )
    }

    #[test]
    fn test_deselect_without_selection_is_noop() {
        let fx = Fixture::new(&[1]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        host.select(None).unwrap();
        host.select(None).unwrap();
        assert!(fx.events().is_empty());
        assert_eq!(fx.bus.owner(), None);
    }

    #[test]
    fn test_select_takes_and_frees_bus() {
        let fx = Fixture::new(&[1]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        host.select(Some(0)).unwrap();
        assert_eq!(fx.bus.owner(), Some(0));
        // binding alone leaves the line alone
        assert!(fx.events().is_empty());

        host.select(None).unwrap();
        assert_eq!(fx.bus.owner(), None);
        assert_eq!(fx.events(), vec![Event::Assert(1, false)]);
    }

    #[test]
    fn test_switching_slot_deasserts_previous() {
        let fx = Fixture::new(&[1, 3]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        host.select(Some(0)).unwrap();
        host.control(None, CtrlFlags::NCE | CtrlFlags::CHANGE).unwrap();
        host.select(Some(1)).unwrap();
        assert_eq!(host.chip().selected(), Some(1));
        assert_eq!(fx.bus.owner(), Some(0));
        assert_eq!(
            fx.events(),
            vec![Event::Assert(1, true), Event::Assert(1, false)]
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let fx = Fixture::new(&[1]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        assert!(matches!(
            host.select(Some(4)),
            Err(Error::NoSuchChipSelect { index: 4, count: 1 })
        ));
        assert_eq!(fx.bus.owner(), None);
    }

    #[test]
    fn test_control_requires_selection() {
        let fx = Fixture::new(&[1]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        assert!(matches!(
            host.control(Some(0x90), CtrlFlags::CLE | CtrlFlags::NCE | CtrlFlags::CHANGE),
            Err(Error::NoChipSelected)
        ));
        assert!(fx.events().is_empty());
    }

    #[test]
    fn test_command_goes_to_cmd_window() {
        let fx = Fixture::new(&[2]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        host.select(Some(0)).unwrap();
        host.control(Some(0xFF), CtrlFlags::CLE | CtrlFlags::NCE | CtrlFlags::CHANGE)
            .unwrap();
        assert_eq!(host.read_byte().unwrap(), 0xA5);
        assert_eq!(
            fx.events(),
            vec![Event::Assert(2, true), Event::Write(2, OFFSET_CMD, 0xFF)]
        );
    }

    struct Pin(bool);

    impl GpioInput for Pin {
        fn get(&mut self) -> core::result::Result<bool, BoxError> {
            Ok(self.0)
        }
        fn is_active_low(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_ready_and_delay() {
        let fx = Fixture::new(&[1]);

        let mut polled = chip(Some(Box::new(Pin(true)) as Box<dyn GpioInput>));
        let mut host = ChipHost::new(&mut polled, fx.shared());
        assert_eq!(host.is_ready().unwrap(), Some(true));
        assert!(host.set_write_protect(true).is_ok());

        let mut delayed = chip(None);
        let mut host = ChipHost::new(&mut delayed, fx.shared());
        assert_eq!(host.is_ready().unwrap(), None);
        assert_eq!(host.chip_delay_us(), 100);
    }

    #[test]
    fn test_hwctl_tracks_direction() {
        let fx = Fixture::new(&[1]);
        let mut chip = chip(None);
        let mut host = ChipHost::new(&mut chip, fx.shared());

        host.ecc_hwctl(EccAccess::Read);
        assert!(host.chip().is_reading());
        host.ecc_hwctl(EccAccess::Write);
        assert!(!host.chip().is_reading());

        // mode none
        let mut code = [0u8; 4];
        assert!(matches!(
            host.ecc_calculate(&[0u8; 16], &mut code),
            Err(Error::EccNotHardware)
        ));
    }

    #[test]
    fn test_geometry_steps() {
        let g = NandGeometry {
            page_data_size: 8192,
            oob_size: 448,
        };
        assert_eq!(g.steps(1024), 8);
        assert_eq!(g.steps(0), 0);
    }
}
