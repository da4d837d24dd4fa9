//! The session gate: a persisted "authenticated" flag in front of the catalog.

pub mod error;
mod gate;
mod store;

pub use error::*;
pub use gate::*;
pub use store::*;
