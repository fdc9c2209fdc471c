//! Minimal NAND core
//!
//! Identifies chips with RESET + READ ID through the [`ChipHost`] and, for
//! hardware ECC, checks that the engine round-trips one chunk before the
//! scan is declared finished.

use std::collections::BTreeSet;

use jznand_core::{BoxError, ChipHost, CtrlFlags, EccAccess, EccStatus, NandGeometry};

use crate::error::DummyError;
use crate::flash::{decode_ext_id, opcodes};

/// Ready polls before giving up
const READY_POLLS: usize = 1000;

/// NAND core driving chips through their hosts
#[derive(Debug, Default)]
pub struct DummyNandCore {
    fail_identify: BTreeSet<usize>,
    fail_scan: BTreeSet<usize>,
    /// ID bytes read from each identified chip
    pub ids: Vec<[u8; 4]>,
}

impl DummyNandCore {
    /// A core that succeeds everywhere
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail identification of chip `id`
    pub fn fail_identify(mut self, id: usize) -> Self {
        self.fail_identify.insert(id);
        self
    }

    /// Fail the final scan of chip `id`
    pub fn fail_scan(mut self, id: usize) -> Self {
        self.fail_scan.insert(id);
        self
    }

    fn command(host: &mut ChipHost<'_>, cmd: u8) -> Result<(), DummyError> {
        host.control(Some(cmd), CtrlFlags::CLE | CtrlFlags::NCE | CtrlFlags::CHANGE)?;
        host.control(None, CtrlFlags::NCE | CtrlFlags::CHANGE)?;
        Ok(())
    }

    fn address(host: &mut ChipHost<'_>, addr: u8) -> Result<(), DummyError> {
        host.control(Some(addr), CtrlFlags::ALE | CtrlFlags::NCE | CtrlFlags::CHANGE)?;
        host.control(None, CtrlFlags::NCE | CtrlFlags::CHANGE)?;
        Ok(())
    }

    fn wait_ready(host: &mut ChipHost<'_>) -> Result<(), DummyError> {
        if host.is_ready()?.is_none() {
            host.delay();
            return Ok(());
        }

        for _ in 0..READY_POLLS {
            if host.is_ready()? == Some(true) {
                return Ok(());
            }
        }
        Err(DummyError::Timeout(host.chip().id()))
    }

    fn read_id(host: &mut ChipHost<'_>) -> Result<[u8; 4], DummyError> {
        let id = host.chip().id();
        host.select(Some(id))?;
        let result = Self::reset_and_read_id(host);
        host.select(None)?;
        result
    }

    fn reset_and_read_id(host: &mut ChipHost<'_>) -> Result<[u8; 4], DummyError> {
        Self::command(host, opcodes::RESET)?;
        Self::wait_ready(host)?;
        Self::command(host, opcodes::READID)?;
        Self::address(host, 0x00)?;
        let mut bytes = [0u8; 4];
        host.read_buf(&mut bytes)?;
        Ok(bytes)
    }

    fn check_ecc(host: &mut ChipHost<'_>) -> Result<(), DummyError> {
        let id = host.chip().id();
        let ecc = host.ecc().clone();
        if !ecc.is_hardware() {
            return Ok(());
        }
        if ecc.layout.is_none() {
            return Err(DummyError::MissingLayout(id));
        }

        let mut chunk = vec![0x5Au8; ecc.chunk_size as usize];
        let mut code = vec![0u8; ecc.ecc_bytes as usize];

        host.ecc_hwctl(EccAccess::Write);
        host.ecc_calculate(&chunk, &mut code)?;

        host.ecc_hwctl(EccAccess::Read);
        host.ecc_calculate(&chunk, &mut code)?;
        match host.ecc_correct(&mut chunk, &code)? {
            EccStatus::Corrected(_) => Ok(()),
            EccStatus::Uncorrectable => Err(DummyError::Core(jznand_core::Error::Engine(
                "self-check chunk uncorrectable".into(),
            ))),
        }
    }
}

impl jznand_core::NandCore for DummyNandCore {
    fn identify(&mut self, host: &mut ChipHost<'_>) -> Result<NandGeometry, BoxError> {
        let id = host.chip().id();
        if self.fail_identify.contains(&id) {
            return Err(DummyError::IdentifyFailed(id).into());
        }

        let bytes = Self::read_id(host)?;
        if bytes[0] == 0x00 || bytes[0] == 0xFF {
            return Err(DummyError::NoDevice(bytes).into());
        }

        let geometry = decode_ext_id(bytes[3]);
        log::info!(
            "chip {}: NAND device {:02x}:{:02x}, {}+{} byte pages",
            id,
            bytes[0],
            bytes[1],
            geometry.page_data_size,
            geometry.oob_size
        );
        self.ids.push(bytes);
        Ok(geometry)
    }

    fn finish_scan(&mut self, host: &mut ChipHost<'_>) -> Result<(), BoxError> {
        let id = host.chip().id();
        if self.fail_scan.contains(&id) {
            return Err(DummyError::ScanFailed(id).into());
        }

        Self::check_ecc(host)?;
        host.set_write_protect(false)?;
        Ok(())
    }
}
