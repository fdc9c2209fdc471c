//! Emulated NAND chip behind a bank window
//!
//! Understands just enough of the command set for device identification:
//! RESET, READ ID and READ STATUS.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use jznand_core::window::{OFFSET_ADDR, OFFSET_CMD};
use jznand_core::{MmioWindow, NandGeometry, Window};

use crate::nemc::{Event, EventLog};

/// NAND command opcodes
pub mod opcodes {
    /// Reset
    pub const RESET: u8 = 0xFF;
    /// Read ID
    pub const READID: u8 = 0x90;
    /// Read status
    pub const STATUS: u8 = 0x70;
}

/// Status: device ready
pub const STATUS_READY: u8 = 0x40;
/// Status: not write protected
pub const STATUS_WP: u8 = 0x80;

/// Identity of the emulated chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyConfig {
    /// Manufacturer ID
    pub manufacturer_id: u8,
    /// Device ID
    pub device_id: u8,
    /// Third ID byte (cell type)
    pub cell_info: u8,
    /// Fourth ID byte (page, OOB and block size)
    pub ext_id: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEC, // Samsung
            device_id: 0xDA,       // K9F2G08, 2 Gbit
            cell_info: 0x10,
            ext_id: 0x95, // 2 KiB pages, 64-byte OOB
        }
    }
}

impl DummyConfig {
    /// ID bytes as returned by READ ID
    pub fn id_bytes(&self) -> [u8; 4] {
        [
            self.manufacturer_id,
            self.device_id,
            self.cell_info,
            self.ext_id,
        ]
    }
}

/// Page geometry encoded in the fourth ID byte
///
/// Bits 0-1: page size as 1 KiB << n. Bit 2: OOB bytes per 512 data bytes,
/// 8 or 16.
pub fn decode_ext_id(ext_id: u8) -> NandGeometry {
    let page_data_size = 1024u32 << (ext_id & 0x3);
    let oob_per_512 = 8u32 << ((ext_id >> 2) & 0x1);
    NandGeometry {
        page_data_size,
        oob_size: oob_per_512 * (page_data_size / 512),
    }
}

#[derive(Debug, Default)]
struct State {
    last_cmd: Option<u8>,
    output: VecDeque<u8>,
}

/// One emulated chip
pub struct DummyFlash {
    bank: u32,
    config: DummyConfig,
    log: Arc<EventLog>,
    state: Mutex<State>,
}

impl DummyFlash {
    /// A chip on `bank` recording into `log`
    pub fn new(bank: u32, config: DummyConfig, log: Arc<EventLog>) -> Self {
        Self {
            bank,
            config,
            log,
            state: Mutex::new(State::default()),
        }
    }

    /// Bank the chip sits on
    pub fn bank(&self) -> u32 {
        self.bank
    }

    fn command(&self, state: &mut State, cmd: u8) {
        state.output.clear();
        match cmd {
            opcodes::RESET => {}
            opcodes::STATUS => state.output.push_back(STATUS_READY | STATUS_WP),
            opcodes::READID => {}
            _ => log::debug!("dummy: bank {}: unsupported command {:#04x}", self.bank, cmd),
        }
        state.last_cmd = Some(cmd);
    }

    fn address(&self, state: &mut State, addr: u8) {
        if state.last_cmd == Some(opcodes::READID) && addr == 0x00 {
            state.output.extend(self.config.id_bytes());
        }
    }
}

fn window_of(offset: usize) -> Window {
    if offset >= OFFSET_ADDR {
        Window::Address
    } else if offset >= OFFSET_CMD {
        Window::Command
    } else {
        Window::Data
    }
}

impl MmioWindow for DummyFlash {
    fn read8(&self, offset: usize) -> u8 {
        debug_assert_eq!(window_of(offset), Window::Data);
        let value = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .output
            .pop_front()
            .unwrap_or(0xFF);
        self.log.push(Event::Read {
            bank: self.bank,
            value,
        });
        value
    }

    fn write8(&self, offset: usize, value: u8) {
        let window = window_of(offset);
        self.log.push(Event::Write {
            bank: self.bank,
            window,
            value,
        });

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match window {
            Window::Command => self.command(&mut state, value),
            Window::Address => self.address(&mut state, value),
            Window::Data => {}
        }
    }
}
