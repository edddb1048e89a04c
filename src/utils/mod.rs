mod chunk;
mod display;

pub use chunk::chunk_reply;
pub use display::*;
