//! jznand - NAND controller bring-up for JZ4780-style SoCs
//!
//! Brings up the NEMC NAND controller described by a board file on one of
//! the built-in backends and reports what it found:
//! - **dummy** emulates the NEMC, the NAND chips and the BCH controller
//! - **physmap** drives the real NEMC through /dev/mem, with ready/busy and
//!   write-protect lines over the Linux GPIO character device

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use jznand_core::BoardConfig;

/// Log level requested on the command line, if raised above the default
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins unless -v is given; default is info
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_level(cli.verbose) {
        logger.filter_level(level);
    }
    logger.init();

    match cli.command {
        Commands::Probe { board, backend } => {
            let board = BoardConfig::from_toml_file(&board)?;
            log::info!("Loaded board with {} chip declaration(s)", board.chip.len());
            let controller = backends::open_controller(&backend, &board)?;
            commands::run_probe(&controller);
            Ok(())
        }
        Commands::EccLayout {
            step_size,
            strength,
            page_size,
            oob_size,
        } => commands::run_ecc_layout(step_size, strength, page_size, oob_size),
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
    }
}
