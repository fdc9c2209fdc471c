//! ECC layout command implementation

use jznand_core::{EccConfig, EccMode, EccSettings, NandGeometry};

/// Plan hardware ECC for a page geometry
fn plan(step_size: u32, strength: u32, geometry: &NandGeometry) -> jznand_core::Result<EccConfig> {
    let mut ecc = EccConfig::new(&EccSettings {
        mode: EccMode::Hardware,
        step_size,
        strength,
    });
    ecc.validate()?;
    ecc.derive_layout(geometry)?;
    Ok(ecc)
}

/// Print ECC bytes and the OOB layout
pub fn run_ecc_layout(
    step_size: u32,
    strength: u32,
    page_size: u32,
    oob_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = NandGeometry {
        page_data_size: page_size,
        oob_size,
    };
    let ecc = plan(step_size, strength, &geometry)?;

    println!("Page:          {} + {} bytes", page_size, oob_size);
    println!(
        "ECC:           BCH strength {}, {} bytes per {} byte step",
        ecc.strength, ecc.ecc_bytes, ecc.chunk_size
    );
    println!("Steps:         {}", geometry.steps(ecc.chunk_size));

    if let Some(layout) = &ecc.layout {
        println!("ECC bytes:     {}", layout.total_ecc_bytes);
        if let Some(start) = layout.ecc_region_start() {
            println!("ECC region:    0x{:02X}..0x{:02X}", start, oob_size);
        }
        println!(
            "Free region:   0x{:02X}, {} bytes",
            layout.free_region.offset, layout.free_region.length
        );
    }

    Ok(())
}
