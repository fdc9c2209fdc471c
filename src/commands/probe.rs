//! Probe command implementation

use jznand_core::{Controller, EccMode};

fn ecc_description(mode: EccMode, strength: u32, step: u32, bytes: u32) -> String {
    match mode {
        EccMode::None => "none".to_string(),
        EccMode::Hardware => format!("hw BCH{}/{} ({} bytes)", strength, step, bytes),
        EccMode::SoftwareDelegated => format!("soft BCH{}/{} ({} bytes)", strength, step, bytes),
    }
}

/// Print the chips registered on a controller
pub fn run_probe(controller: &Controller) {
    println!(
        "NEMC: {} banks, {} NAND chip(s)",
        controller.num_banks(),
        controller.chips().len()
    );
    if controller.ecc_engine_acquired() {
        println!("BCH controller in use");
    }
    println!();
    println!(
        "{:<5} {:<5} {:>8} {:>6} {:<26} {:<4} {:<4}",
        "Chip", "Bank", "Page", "OOB", "ECC", "R/B", "WP"
    );
    println!("{}", "-".repeat(62));

    for chip in controller.chips() {
        let (page, oob) = match chip.geometry() {
            Some(g) => (g.page_data_size.to_string(), g.oob_size.to_string()),
            None => ("?".to_string(), "?".to_string()),
        };
        let ecc = chip.ecc();
        println!(
            "{:<5} {:<5} {:>8} {:>6} {:<26} {:<4} {:<4}",
            chip.id(),
            chip.bank(),
            page,
            oob,
            ecc_description(ecc.mode, ecc.strength, ecc.chunk_size, ecc.ecc_bytes),
            if chip.has_ready_line() { "gpio" } else { "-" },
            if chip.has_write_protect() { "gpio" } else { "-" },
        );
    }
}
