//! Command/address/data multiplexing over a bank window
//!
//! Each bank window is split into three fixed sub-windows. A byte written to
//! the COMMAND sub-window is latched by the chip as a command (CLE high), a
//! byte written to ADDRESS as an address cycle (ALE high), and DATA carries
//! plain data cycles.

use std::sync::Arc;

use bitflags::bitflags;

use crate::bank::BankSlot;
use crate::error::{Error, Result};
use crate::hw::{MmioWindow, Nemc};

/// Offset of the DATA sub-window
pub const OFFSET_DATA: usize = 0x0000_0000;
/// Offset of the COMMAND sub-window
pub const OFFSET_CMD: usize = 0x0040_0000;
/// Offset of the ADDRESS sub-window
pub const OFFSET_ADDR: usize = 0x0080_0000;

bitflags! {
    /// Control line flags passed to [`ChipWindow::control`]
    ///
    /// Values follow the Linux NAND core (`NAND_NCE`, `NAND_CLE`, `NAND_ALE`,
    /// `NAND_CTRL_CHANGE`).
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CtrlFlags: u32 {
        /// Chip enable
        const NCE    = 0x01;
        /// Command latch enable
        const CLE    = 0x02;
        /// Address latch enable
        const ALE    = 0x04;
        /// Line state changed, recompute window and chip enable
        const CHANGE = 0x80;
    }
}

/// One of the three sub-windows of a bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Data cycles
    Data,
    /// Command latch
    Command,
    /// Address latch
    Address,
}

impl Window {
    /// Offset of this sub-window from the bank base
    pub const fn offset(self) -> usize {
        match self {
            Window::Data => OFFSET_DATA,
            Window::Command => OFFSET_CMD,
            Window::Address => OFFSET_ADDR,
        }
    }

    /// Sub-window selected by a set of control lines (ALE wins over CLE)
    pub fn from_ctrl(ctrl: CtrlFlags) -> Self {
        if ctrl.contains(CtrlFlags::ALE) {
            Window::Address
        } else if ctrl.contains(CtrlFlags::CLE) {
            Window::Command
        } else {
            Window::Data
        }
    }
}

/// A mapped chip-select slot
#[derive(Clone)]
pub struct ChipSelect {
    /// Bank and window description
    pub slot: BankSlot,
    io: Arc<dyn MmioWindow>,
}

impl ChipSelect {
    /// Pair a slot with its mapped window
    pub fn new(slot: BankSlot, io: Arc<dyn MmioWindow>) -> Self {
        Self { slot, io }
    }
}

impl core::fmt::Debug for ChipSelect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChipSelect").field("slot", &self.slot).finish()
    }
}

/// Window currently bound to a chip
#[derive(Clone)]
struct Binding {
    index: usize,
    bank: u32,
    io: Arc<dyn MmioWindow>,
}

/// Per-chip view of the bank windows
///
/// Tracks which slot the chip is bound to, which sub-window byte writes go
/// to, and the state of the chip-select line.
pub struct ChipWindow {
    bound: Option<Binding>,
    active: Window,
    asserted: bool,
}

impl core::fmt::Debug for ChipWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChipWindow")
            .field("selected", &self.selected())
            .field("bank", &self.bank())
            .field("active", &self.active)
            .field("asserted", &self.asserted)
            .finish()
    }
}

impl Default for ChipWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipWindow {
    /// An unbound window
    pub fn new() -> Self {
        Self {
            bound: None,
            active: Window::Data,
            asserted: false,
        }
    }

    /// Bind to chip-select slot `index`
    ///
    /// Resets the active sub-window to DATA. The chip-select line is not
    /// touched.
    pub fn bind(&mut self, index: usize, cs: &ChipSelect) {
        self.bound = Some(Binding {
            index,
            bank: cs.slot.bank,
            io: Arc::clone(&cs.io),
        });
        self.active = Window::Data;
    }

    /// Deassert the line of the bound slot and drop the binding
    ///
    /// Returns false, without touching any line, if nothing was bound.
    pub fn unbind(&mut self, nemc: &dyn Nemc) -> bool {
        match self.bound.take() {
            Some(binding) => {
                log::trace!("bank {}: deassert", binding.bank);
                nemc.assert_bank(binding.bank, false);
                self.asserted = false;
                true
            }
            None => false,
        }
    }

    /// Drive the control lines and optionally write a byte
    ///
    /// With `CHANGE` set, the active sub-window is recomputed from ALE/CLE and
    /// the chip-select line follows NCE. Only then is `cmd`, if any, written
    /// to the active sub-window.
    pub fn control(&mut self, nemc: &dyn Nemc, cmd: Option<u8>, ctrl: CtrlFlags) -> Result<()> {
        let binding = self.bound.as_ref().ok_or(Error::NoChipSelected)?;

        if ctrl.contains(CtrlFlags::CHANGE) {
            self.active = Window::from_ctrl(ctrl);
            self.asserted = ctrl.contains(CtrlFlags::NCE);
            log::trace!(
                "bank {}: window {:?}, cs {}",
                binding.bank,
                self.active,
                self.asserted
            );
            nemc.assert_bank(binding.bank, self.asserted);
        }

        if let Some(byte) = cmd {
            binding.io.write8(self.active.offset(), byte);
        }

        Ok(())
    }

    /// Read one data byte
    ///
    /// Reads always go through the DATA sub-window.
    pub fn read_byte(&self) -> Result<u8> {
        let binding = self.bound.as_ref().ok_or(Error::NoChipSelected)?;
        Ok(binding.io.read8(OFFSET_DATA))
    }

    /// Write one byte to the active sub-window
    pub fn write_byte(&self, byte: u8) -> Result<()> {
        let binding = self.bound.as_ref().ok_or(Error::NoChipSelected)?;
        binding.io.write8(self.active.offset(), byte);
        Ok(())
    }

    /// Fill `buf` from the DATA sub-window
    pub fn read_buf(&self, buf: &mut [u8]) -> Result<()> {
        let binding = self.bound.as_ref().ok_or(Error::NoChipSelected)?;
        for byte in buf.iter_mut() {
            *byte = binding.io.read8(OFFSET_DATA);
        }
        Ok(())
    }

    /// Write `buf` to the active sub-window
    pub fn write_buf(&self, buf: &[u8]) -> Result<()> {
        let binding = self.bound.as_ref().ok_or(Error::NoChipSelected)?;
        for &byte in buf {
            binding.io.write8(self.active.offset(), byte);
        }
        Ok(())
    }

    /// Slot index the window is bound to
    pub fn selected(&self) -> Option<usize> {
        self.bound.as_ref().map(|b| b.index)
    }

    /// Bank the window is bound to
    pub fn bank(&self) -> Option<u32> {
        self.bound.as_ref().map(|b| b.bank)
    }

    /// Sub-window byte writes currently go to
    pub fn active_window(&self) -> Window {
        self.active
    }

    /// State of the chip-select line as last driven
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::BankType;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Assert(u32, bool),
        Write(usize, u8),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Nemc for Recorder {
        fn num_banks(&self) -> usize {
            6
        }
        fn set_bank_type(&self, _bank: u32, _kind: BankType) {}
        fn assert_bank(&self, bank: u32, assert: bool) {
            self.events.lock().unwrap().push(Event::Assert(bank, assert));
        }
    }

    impl MmioWindow for Recorder {
        fn read8(&self, _offset: usize) -> u8 {
            0xA5
        }
        fn write8(&self, offset: usize, value: u8) {
            self.events.lock().unwrap().push(Event::Write(offset, value));
        }
    }

    fn setup() -> (Arc<Recorder>, ChipSelect) {
        let rec = Arc::new(Recorder::default());
        let slot = BankSlot {
            bank: 3,
            base: 0x1c00_0000,
            size: 0x0100_0000,
        };
        let cs = ChipSelect::new(slot, rec.clone());
        (rec, cs)
    }

    fn events(rec: &Recorder) -> Vec<Event> {
        rec.events.lock().unwrap().clone()
    }

    #[test]
    fn test_control_without_selection() {
        let (rec, _cs) = setup();
        let mut window = ChipWindow::new();
        let err = window
            .control(&*rec, Some(0x70), CtrlFlags::CLE | CtrlFlags::CHANGE)
            .unwrap_err();
        assert!(matches!(err, Error::NoChipSelected));
        assert!(events(&rec).is_empty());
    }

    #[test]
    fn test_bind_resets_to_data() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();
        window.bind(0, &cs);
        window
            .control(&*rec, None, CtrlFlags::ALE | CtrlFlags::NCE | CtrlFlags::CHANGE)
            .unwrap();
        assert_eq!(window.active_window(), Window::Address);

        window.bind(0, &cs);
        assert_eq!(window.active_window(), Window::Data);
        assert_eq!(window.selected(), Some(0));
        assert_eq!(window.bank(), Some(3));
    }

    #[test]
    fn test_line_change_precedes_write() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();
        window.bind(0, &cs);

        window
            .control(
                &*rec,
                Some(0x00),
                CtrlFlags::ALE | CtrlFlags::NCE | CtrlFlags::CHANGE,
            )
            .unwrap();

        assert_eq!(window.active_window(), Window::Address);
        assert!(window.is_asserted());
        assert_eq!(
            events(&rec),
            vec![Event::Assert(3, true), Event::Write(OFFSET_ADDR, 0x00)]
        );
    }

    #[test]
    fn test_command_sequence() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();
        window.bind(0, &cs);

        let nce = CtrlFlags::NCE | CtrlFlags::CHANGE;
        window.control(&*rec, Some(0x90), nce | CtrlFlags::CLE).unwrap();
        window.control(&*rec, Some(0x00), nce | CtrlFlags::ALE).unwrap();
        // No CHANGE: window and line stay as they were
        window.control(&*rec, Some(0x01), CtrlFlags::empty()).unwrap();
        window.control(&*rec, None, nce).unwrap();
        window.write_byte(0x5A).unwrap();

        assert_eq!(
            events(&rec),
            vec![
                Event::Assert(3, true),
                Event::Write(OFFSET_CMD, 0x90),
                Event::Assert(3, true),
                Event::Write(OFFSET_ADDR, 0x00),
                Event::Write(OFFSET_ADDR, 0x01),
                Event::Assert(3, true),
                Event::Write(OFFSET_DATA, 0x5A),
            ]
        );
    }

    #[test]
    fn test_deassert_without_nce() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();
        window.bind(0, &cs);
        window
            .control(&*rec, None, CtrlFlags::NCE | CtrlFlags::CHANGE)
            .unwrap();
        window.control(&*rec, None, CtrlFlags::CHANGE).unwrap();
        assert!(!window.is_asserted());
        assert_eq!(
            events(&rec),
            vec![Event::Assert(3, true), Event::Assert(3, false)]
        );
    }

    #[test]
    fn test_unbind() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();

        assert!(!window.unbind(&*rec));
        assert!(events(&rec).is_empty());

        window.bind(0, &cs);
        assert!(window.unbind(&*rec));
        assert_eq!(events(&rec), vec![Event::Assert(3, false)]);
        assert_eq!(window.selected(), None);
        assert!(window.read_byte().is_err());
    }

    #[test]
    fn test_reads_use_data_window() {
        let (rec, cs) = setup();
        let mut window = ChipWindow::new();
        window.bind(0, &cs);
        window
            .control(&*rec, None, CtrlFlags::CLE | CtrlFlags::CHANGE)
            .unwrap();
        let mut buf = [0u8; 3];
        window.read_buf(&mut buf).unwrap();
        assert_eq!(buf, [0xA5; 3]);
        assert_eq!(window.read_byte().unwrap(), 0xA5);
    }

    #[test]
    fn test_window_from_ctrl() {
        assert_eq!(Window::from_ctrl(CtrlFlags::ALE | CtrlFlags::CLE), Window::Address);
        assert_eq!(Window::from_ctrl(CtrlFlags::CLE), Window::Command);
        assert_eq!(Window::from_ctrl(CtrlFlags::NCE), Window::Data);
        assert_eq!(Window::from_ctrl(CtrlFlags::default()), Window::Data);
    }

    #[test]
    fn test_default_flags_are_empty() {
        assert!(CtrlFlags::default().is_empty());
    }
}
