pub mod pricing;
pub mod product;
mod wire;

pub use pricing::*;
pub use product::*;
