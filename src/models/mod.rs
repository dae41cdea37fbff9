pub mod chunk;
pub mod result;

pub use chunk::*;
pub use result::*;
