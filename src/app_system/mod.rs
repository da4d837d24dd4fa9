//! System orchestration, startup, and shutdown logic.

pub mod catalog_system;
pub mod logging;

pub use catalog_system::*;
pub use logging::*;
