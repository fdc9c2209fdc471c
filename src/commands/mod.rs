//! CLI command implementations

mod layout;
mod list;
mod probe;

pub use layout::run_ecc_layout;
pub use list::list_backends;
pub use probe::run_probe;
