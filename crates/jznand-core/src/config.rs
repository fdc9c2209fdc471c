//! Board description parsing
//!
//! The controller consumes its configuration; it never discovers it. A board
//! is described in TOML:
//!
//! ```toml
//! [controller]
//! nemc_base = "0x13410000"
//! num_banks = 6
//!
//! [ecc_engine]
//! kind = "dummy"
//!
//! [[chip]]
//! bank = 1
//! base = "0x1b000000"
//! rb_gpio = { chip = "/dev/gpiochip0", line = 20, active_low = true }
//! wp_gpio = { chip = "/dev/gpiochip0", line = 22 }
//! ecc = { mode = "hw", step_size = 1024, strength = 24 }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::bank::DEFAULT_WINDOW_SIZE;
use crate::ecc::EccMode;
use crate::error::{Error, Result};

/// A GPIO line reference
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GpioSpec {
    /// GPIO chip device (e.g. "/dev/gpiochip0")
    pub chip: String,
    /// Line offset on the chip
    pub line: u32,
    /// Line polarity
    #[serde(default)]
    pub active_low: bool,
}

/// ECC settings of a chip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EccSettings {
    /// Where correction runs
    #[serde(default)]
    pub mode: EccMode,
    /// Data bytes per ECC chunk
    #[serde(default)]
    pub step_size: u32,
    /// Correctable bits per chunk
    #[serde(default)]
    pub strength: u32,
}

/// Declaration of one chip attached to the controller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChipDecl {
    /// NEMC bank the chip sits on
    #[serde(default)]
    pub bank: Option<u32>,
    /// Physical base of the bank window
    #[serde(default, deserialize_with = "deserialize_hex_u64")]
    pub base: u64,
    /// Size of the bank window
    #[serde(default = "default_window_size", deserialize_with = "deserialize_size")]
    pub size: usize,
    /// Ready/busy input
    #[serde(default)]
    pub rb_gpio: Option<GpioSpec>,
    /// Write-protect output
    #[serde(default)]
    pub wp_gpio: Option<GpioSpec>,
    /// ECC settings
    #[serde(default)]
    pub ecc: EccSettings,
}

impl Default for ChipDecl {
    fn default() -> Self {
        Self {
            bank: None,
            base: 0,
            size: DEFAULT_WINDOW_SIZE,
            rb_gpio: None,
            wp_gpio: None,
            ecc: EccSettings::default(),
        }
    }
}

/// Controller section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControllerConfig {
    /// Physical base of the NEMC register block
    #[serde(default, deserialize_with = "deserialize_opt_hex_u64")]
    pub nemc_base: Option<u64>,
    /// Number of banks wired to the NEMC
    #[serde(default)]
    pub num_banks: Option<usize>,
}

/// BCH controller reference
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Engine implementation name
    pub kind: String,
}

/// A complete board description
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BoardConfig {
    /// NEMC parameters
    #[serde(default)]
    pub controller: ControllerConfig,
    /// BCH controller, if the board has one
    #[serde(default)]
    pub ecc_engine: Option<EngineConfig>,
    /// Chips in declaration order
    #[serde(default)]
    pub chip: Vec<ChipDecl>,
}

impl BoardConfig {
    /// Load a board description from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    /// Parse a board description from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::Config)
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

/// Integer or string form of a number
#[derive(Deserialize)]
#[serde(untagged)]
enum HexOrInt {
    Int(u64),
    Str(String),
}

impl HexOrInt {
    fn value(self) -> core::result::Result<u64, String> {
        match self {
            HexOrInt::Int(n) => Ok(n),
            HexOrInt::Str(s) => parse_number(&s),
        }
    }
}

/// Deserialize a u64 that can be hex (0x...) or decimal
fn deserialize_hex_u64<'de, D>(deserializer: D) -> core::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    HexOrInt::deserialize(deserializer)?
        .value()
        .map_err(serde::de::Error::custom)
}

fn deserialize_opt_hex_u64<'de, D>(deserializer: D) -> core::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<HexOrInt>::deserialize(deserializer)?
        .map(HexOrInt::value)
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn deserialize_size<'de, D>(deserializer: D) -> core::result::Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let size = deserialize_hex_u64(deserializer)?;
    usize::try_from(size).map_err(serde::de::Error::custom)
}

/// Parse a number that can be hex (0x...) or decimal
pub fn parse_number(s: &str) -> core::result::Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("4096").unwrap(), 4096);
        assert_eq!(parse_number("0x1000").unwrap(), 4096);
        assert_eq!(parse_number(" 0X1b000000 ").unwrap(), 0x1b00_0000);
        assert!(parse_number("0xzz").is_err());
        assert!(parse_number("twelve").is_err());
    }

    #[test]
    fn test_parse_board() {
        let toml = r#"
[controller]
nemc_base = "0x13410000"
num_banks = 6

[ecc_engine]
kind = "dummy"

[[chip]]
bank = 1
base = "0x1b000000"
rb_gpio = { chip = "/dev/gpiochip0", line = 20, active_low = true }
wp_gpio = { chip = "/dev/gpiochip0", line = 22 }
ecc = { mode = "hw", step_size = 1024, strength = 24 }

[[chip]]
bank = 3
base = 469762048
size = "0x800001"
ecc = { mode = "soft_bch", step_size = 512, strength = 4 }
"#;
        let board = BoardConfig::from_toml_str(toml).unwrap();
        assert_eq!(board.controller.nemc_base, Some(0x1341_0000));
        assert_eq!(board.controller.num_banks, Some(6));
        assert_eq!(board.ecc_engine.as_ref().unwrap().kind, "dummy");
        assert_eq!(board.chip.len(), 2);

        let first = &board.chip[0];
        assert_eq!(first.bank, Some(1));
        assert_eq!(first.base, 0x1b00_0000);
        assert_eq!(first.size, DEFAULT_WINDOW_SIZE);
        let rb = first.rb_gpio.as_ref().unwrap();
        assert_eq!(rb.line, 20);
        assert!(rb.active_low);
        assert!(!first.wp_gpio.as_ref().unwrap().active_low);
        assert_eq!(first.ecc.mode, EccMode::Hardware);
        assert_eq!(first.ecc.step_size, 1024);

        let second = &board.chip[1];
        assert_eq!(second.base, 0x1c00_0000);
        assert_eq!(second.size, 0x80_0001);
        assert_eq!(second.ecc.mode, EccMode::SoftwareDelegated);
        assert!(second.rb_gpio.is_none());
    }

    #[test]
    fn test_defaults() {
        let board = BoardConfig::from_toml_str("[[chip]]\nbank = 2\n").unwrap();
        assert!(board.ecc_engine.is_none());
        assert_eq!(board.controller, ControllerConfig::default());
        assert_eq!(board.chip[0].ecc.mode, EccMode::None);
        assert_eq!(board.chip[0].size, DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn test_bad_mode_rejected() {
        let err = BoardConfig::from_toml_str("[[chip]]\nbank = 2\necc = { mode = \"magic\" }\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_file_keeps_io_error() {
        let err = BoardConfig::from_toml_file("/nonexistent/board.toml").unwrap_err();
        match &err {
            Error::ConfigRead { path, source } => {
                assert_eq!(path, Path::new("/nonexistent/board.toml"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }
}
