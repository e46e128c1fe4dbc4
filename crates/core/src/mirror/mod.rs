mod processor;
mod reconcile;
mod types;

pub use processor::*;
pub use reconcile::*;
pub use types::*;
