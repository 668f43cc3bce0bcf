pub mod channels;
pub mod exposure;

pub use channels::*;
pub use exposure::*;
