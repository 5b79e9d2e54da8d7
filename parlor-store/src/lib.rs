pub mod memory;
pub mod store;

pub use memory::*;
pub use store::*;
