//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_u32(s: &str) -> Result<u32, String> {
    let value = jznand_core::config::parse_number(s)?;
    u32::try_from(value).map_err(|_| format!("{} does not fit in 32 bits", s))
}

#[derive(Parser)]
#[command(name = "jznand")]
#[command(author, version, about = "JZ4780 NEMC NAND controller bring-up", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring up the controller described by a board file and list its chips
    Probe {
        /// Board description (TOML format)
        #[arg(short, long)]
        board: PathBuf,

        /// Backend to use (see list-backends)
        #[arg(long, default_value = "dummy")]
        backend: String,
    },

    /// Show the hardware ECC layout for a page geometry
    EccLayout {
        /// Data bytes per ECC chunk
        #[arg(long, value_parser = parse_u32)]
        step_size: u32,

        /// Correctable bits per chunk
        #[arg(long, value_parser = parse_u32)]
        strength: u32,

        /// Page data size in bytes (hex or decimal)
        #[arg(long, value_parser = parse_u32)]
        page_size: u32,

        /// OOB size in bytes (hex or decimal)
        #[arg(long, value_parser = parse_u32)]
        oob_size: u32,
    },

    /// List supported backends
    ListBackends,
}
