mod batch;
mod traits;
mod types;

pub use batch::*;
pub use traits::*;
pub use types::*;
