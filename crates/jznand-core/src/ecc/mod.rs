//! Error correction setup and dispatch
//!
//! - [`planner`] derives the ECC byte width and, for hardware mode, the OOB
//!   layout, and forwards calculate/correct requests to the engine
//! - [`layout`] holds the OOB layout types
//! - [`engine`] holds the engine parameters and the controller-owned handle

pub mod engine;
pub mod layout;
pub mod planner;

pub use engine::{EccAccess, EccEngineHandle, EccParams, EccStatus};
pub use layout::{EccLayout, OobFree};
pub use planner::{ecc_bytes, EccConfig, EccMode};
