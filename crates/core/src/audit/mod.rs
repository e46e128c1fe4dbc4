mod events;
mod handle;
mod jsonl;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use jsonl::*;
pub use store::*;
pub use writer::*;
