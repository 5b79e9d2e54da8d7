use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum GameType {
    Connect,
    Yahtzee,
    Battleship,
}

impl GameType {
    /// Document-store collection holding sessions of this game.
    pub fn collection(self) -> &'static str {
        match self {
            GameType::Connect => "connect",
            GameType::Yahtzee => "yahtzee",
            GameType::Battleship => "battleship",
        }
    }
}

/// A pointer from a user's directory record to a session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameRef {
    pub game: GameType,
    pub id: GameId,
}

/// Per-account directory record: identity, cumulative wins, joined games
/// and pending invites. The `games` and `invites` lists are append-only
/// within any single transaction; invites are additionally removed by id
/// on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRecord {
    pub uid: UserId,
    pub name: String,
    pub is_anonymous: bool,
    pub wins: u32,
    pub games: Vec<GameRef>,
    pub invites: Vec<GameRef>,
    pub created_at: String, // ISO 8601 string
}
