mod http;
mod traits;
mod types;

pub use http::*;
pub use traits::*;
pub use types::*;
