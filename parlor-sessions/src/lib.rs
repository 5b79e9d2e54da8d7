pub mod directory;
pub mod session;

pub use directory::*;
pub use session::*;

use parlor_rules::{BattleshipRules, ConnectRules, YahtzeeRules};

pub type ConnectSessions = session::SessionClient<ConnectRules>;
pub type YahtzeeSessions = session::SessionClient<YahtzeeRules>;
pub type BattleshipSessions = session::SessionClient<BattleshipRules>;
