//! ECC planning and runtime dispatch

use serde::Deserialize;

use crate::chip::NandGeometry;
use crate::config::EccSettings;
use crate::error::{Error, Result};
use crate::hw::EccEngine;

use super::engine::{EccParams, EccStatus};
use super::layout::EccLayout;

/// Where error correction runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum EccMode {
    /// No ECC
    #[default]
    #[serde(rename = "none")]
    None,
    /// The BCH controller computes and corrects
    #[serde(rename = "hw", alias = "hardware")]
    Hardware,
    /// The NAND core runs a software code and owns the layout
    #[serde(rename = "soft", alias = "soft_bch")]
    SoftwareDelegated,
}

/// ECC bytes needed per chunk for a BCH code
///
/// `bit_length(1 + 8 * chunk_size) * strength / 8`, truncating.
pub fn ecc_bytes(chunk_size: u32, strength: u32) -> u32 {
    let n = 1 + 8 * u64::from(chunk_size);
    let bit_length = u64::from(u64::BITS - n.leading_zeros());
    (bit_length * u64::from(strength) / 8) as u32
}

/// ECC configuration of one chip
///
/// Fixed once the chip is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EccConfig {
    /// Data bytes per chunk
    pub chunk_size: u32,
    /// Correctable bits per chunk
    pub strength: u32,
    /// ECC bytes per chunk, derived from the two above
    pub ecc_bytes: u32,
    /// Where correction runs
    pub mode: EccMode,
    /// OOB placement, hardware mode only
    pub layout: Option<EccLayout>,
}

impl EccConfig {
    /// Configuration before the page geometry is known
    pub fn new(settings: &EccSettings) -> Self {
        Self {
            chunk_size: settings.step_size,
            strength: settings.strength,
            ecc_bytes: ecc_bytes(settings.step_size, settings.strength),
            mode: settings.mode,
            layout: None,
        }
    }

    /// Whether the BCH controller is needed
    pub fn is_hardware(&self) -> bool {
        self.mode == EccMode::Hardware
    }

    /// Parameters forwarded to the engine
    pub fn params(&self) -> EccParams {
        EccParams {
            size: self.chunk_size,
            bytes: self.ecc_bytes,
            strength: self.strength,
        }
    }

    /// Check that hardware-mode parameters describe a code
    pub fn validate(&self) -> Result<()> {
        if !self.is_hardware() {
            return Ok(());
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidEccConfig("hardware ECC needs a step size"));
        }
        if self.strength == 0 {
            return Err(Error::InvalidEccConfig("hardware ECC needs a strength"));
        }
        Ok(())
    }

    /// Derive the OOB layout
    ///
    /// Only hardware mode gets one; for software mode the NAND core generates
    /// its own.
    pub fn derive_layout(&mut self, geometry: &NandGeometry) -> Result<()> {
        self.layout = if self.is_hardware() {
            Some(EccLayout::right_aligned(
                geometry,
                self.chunk_size,
                self.ecc_bytes,
            )?)
        } else {
            None
        };
        Ok(())
    }

    /// Log the ECC decision
    pub fn log_summary(&self) {
        if self.mode == EccMode::None {
            log::info!("not using ECC");
        } else {
            log::info!(
                "using {} BCH (strength {}, size {}, bytes {})",
                if self.is_hardware() { "hardware" } else { "software" },
                self.strength,
                self.chunk_size,
                self.ecc_bytes
            );
        }
    }

    /// Compute the ECC bytes of a chunk
    ///
    /// During a read pass nothing is computed and 0 is returned: the engine
    /// derives the code itself while correcting. Otherwise the request goes
    /// to the engine and `ecc_bytes` is returned.
    pub fn calculate(
        &self,
        engine: Option<&dyn EccEngine>,
        reading: bool,
        data: &[u8],
        ecc_code: &mut [u8],
    ) -> Result<usize> {
        let engine = self.engine(engine)?;
        if reading {
            return Ok(0);
        }

        engine
            .calculate(&self.params(), data, ecc_code)
            .map_err(Error::Engine)?;
        Ok(self.ecc_bytes as usize)
    }

    /// Check and correct a chunk in place
    pub fn correct(
        &self,
        engine: Option<&dyn EccEngine>,
        data: &mut [u8],
        read_ecc: &[u8],
    ) -> Result<EccStatus> {
        let engine = self.engine(engine)?;
        let status = engine
            .correct(&self.params(), data, read_ecc)
            .map_err(Error::Engine)?;
        if status == EccStatus::Uncorrectable {
            log::debug!("uncorrectable chunk ({} bytes)", data.len());
        }
        Ok(status)
    }

    fn engine<'a>(&self, engine: Option<&'a dyn EccEngine>) -> Result<&'a dyn EccEngine> {
        if !self.is_hardware() {
            return Err(Error::EccNotHardware);
        }
        engine.ok_or(Error::EngineNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use std::sync::Mutex;

    #[test]
    fn test_ecc_bytes() {
        // bit_length(4097) = 13
        assert_eq!(ecc_bytes(512, 8), 13);
        assert_eq!(ecc_bytes(512, 4), 6);
        assert_eq!(ecc_bytes(1024, 24), 42);
        assert_eq!(ecc_bytes(1024, 40), 70);
        // truncating: 13 * 3 / 8 = 4.875
        assert_eq!(ecc_bytes(512, 3), 4);
        assert_eq!(ecc_bytes(0, 0), 0);
    }

    fn settings(mode: EccMode, step_size: u32, strength: u32) -> EccSettings {
        EccSettings {
            mode,
            step_size,
            strength,
        }
    }

    #[test]
    fn test_bytes_computed_in_every_mode() {
        for mode in [EccMode::None, EccMode::Hardware, EccMode::SoftwareDelegated] {
            let config = EccConfig::new(&settings(mode, 512, 8));
            assert_eq!(config.ecc_bytes, 13);
        }
    }

    #[test]
    fn test_layout_only_for_hardware() {
        let geometry = NandGeometry {
            page_data_size: 2048,
            oob_size: 64,
        };

        let mut hw = EccConfig::new(&settings(EccMode::Hardware, 512, 8));
        hw.derive_layout(&geometry).unwrap();
        assert_eq!(hw.layout.as_ref().unwrap().total_ecc_bytes, 52);

        let mut soft = EccConfig::new(&settings(EccMode::SoftwareDelegated, 512, 8));
        soft.derive_layout(&geometry).unwrap();
        assert!(soft.layout.is_none());

        let mut none = EccConfig::new(&settings(EccMode::None, 0, 0));
        none.derive_layout(&geometry).unwrap();
        assert!(none.layout.is_none());
    }

    #[test]
    fn test_validate() {
        assert!(EccConfig::new(&settings(EccMode::Hardware, 0, 8))
            .validate()
            .is_err());
        assert!(EccConfig::new(&settings(EccMode::Hardware, 512, 0))
            .validate()
            .is_err());
        assert!(EccConfig::new(&settings(EccMode::None, 0, 0))
            .validate()
            .is_ok());
    }

    #[derive(Default)]
    struct Recorder {
        calculated: Mutex<Vec<EccParams>>,
        corrected: Mutex<Vec<EccParams>>,
    }

    impl EccEngine for Recorder {
        fn calculate(
            &self,
            params: &EccParams,
            _data: &[u8],
            ecc_code: &mut [u8],
        ) -> core::result::Result<(), BoxError> {
            ecc_code.fill(0x5A);
            self.calculated.lock().unwrap().push(*params);
            Ok(())
        }

        fn correct(
            &self,
            params: &EccParams,
            data: &mut [u8],
            _read_ecc: &[u8],
        ) -> core::result::Result<EccStatus, BoxError> {
            self.corrected.lock().unwrap().push(*params);
            if data.first() == Some(&0xEE) {
                Ok(EccStatus::Uncorrectable)
            } else {
                Ok(EccStatus::Corrected(1))
            }
        }
    }

    #[test]
    fn test_calculate_skipped_when_reading() {
        let engine = Recorder::default();
        let config = EccConfig::new(&settings(EccMode::Hardware, 512, 8));
        let data = [0u8; 512];
        let mut code = [0u8; 13];

        let n = config.calculate(Some(&engine), true, &data, &mut code).unwrap();
        assert_eq!(n, 0);
        assert_eq!(code, [0u8; 13]);
        assert!(engine.calculated.lock().unwrap().is_empty());
    }

    #[test]
    fn test_calculate_forwards_params() {
        let engine = Recorder::default();
        let config = EccConfig::new(&settings(EccMode::Hardware, 1024, 24));
        let data = [0u8; 1024];
        let mut code = [0u8; 42];

        let n = config.calculate(Some(&engine), false, &data, &mut code).unwrap();
        assert_eq!(n, 42);
        assert_eq!(code, [0x5A; 42]);
        assert_eq!(
            *engine.calculated.lock().unwrap(),
            vec![EccParams {
                size: 1024,
                bytes: 42,
                strength: 24
            }]
        );
    }

    #[test]
    fn test_correct_always_forwards() {
        let engine = Recorder::default();
        let config = EccConfig::new(&settings(EccMode::Hardware, 512, 8));
        let mut data = [0u8; 512];
        let code = [0u8; 13];

        assert_eq!(
            config.correct(Some(&engine), &mut data, &code).unwrap(),
            EccStatus::Corrected(1)
        );
        data[0] = 0xEE;
        assert_eq!(
            config.correct(Some(&engine), &mut data, &code).unwrap(),
            EccStatus::Uncorrectable
        );
        assert_eq!(engine.corrected.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_dispatch_requires_hardware_mode() {
        let engine = Recorder::default();
        let config = EccConfig::new(&settings(EccMode::SoftwareDelegated, 512, 8));
        let mut data = [0u8; 512];
        let mut code = [0u8; 13];
        assert!(matches!(
            config.calculate(Some(&engine), false, &data, &mut code),
            Err(Error::EccNotHardware)
        ));
        assert!(matches!(
            config.correct(Some(&engine), &mut data, &code),
            Err(Error::EccNotHardware)
        ));
    }
}
