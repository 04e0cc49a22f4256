mod capacity;
mod errors;

pub use capacity::*;
pub use errors::*;
