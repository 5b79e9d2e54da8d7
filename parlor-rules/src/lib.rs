pub mod battleship;
pub mod connect;
pub mod machine;
pub mod yahtzee;

// Re-export main components
pub use battleship::*;
pub use connect::*;
pub use machine::*;
pub use yahtzee::*;
