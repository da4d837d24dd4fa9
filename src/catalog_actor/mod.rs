//! The catalog store: the in-memory product collection, kept in sync with the
//! remote catalog service by a single actor task.

mod actor;
pub mod error;
mod messages;

pub use actor::*;
pub use error::*;
pub use messages::CatalogRequest;
