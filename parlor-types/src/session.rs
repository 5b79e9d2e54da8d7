use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque user identifier handed out by the identity provider.
pub type UserId = String;
/// Opaque session document identifier minted by the document store.
pub type GameId = String;

/// A claimed seat in a session: who sits there and what to call them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSlot {
    pub uid: UserId,
    pub name: String,
}

impl PlayerSlot {
    pub fn new(uid: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }
}

/// Terminal state of a session. Derived solely from the board state by the
/// rule module's terminal check; once set to a non-`InProgress` value no
/// further moves are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Outcome {
    InProgress,
    Won { seat: usize },
    Tie,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}
