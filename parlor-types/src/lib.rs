pub mod battleship;
pub mod connect;
pub mod errors;
pub mod session;
pub mod user;
pub mod yahtzee;

// Re-export all types
pub use battleship::*;
pub use connect::*;
pub use errors::*;
pub use session::*;
pub use user::*;
pub use yahtzee::*;
