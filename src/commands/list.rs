//! List commands implementation

use crate::backends::available_backends;

/// List all backends built into this binary
pub fn list_backends() {
    println!("Supported backends:");
    println!();
    for backend in available_backends() {
        if backend.aliases.is_empty() {
            println!("  {:<10} - {}", backend.name, backend.description);
        } else {
            println!(
                "  {:<10} - {} (aliases: {})",
                backend.name,
                backend.description,
                backend.aliases.join(", ")
            );
        }
    }
}
