use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Outcome, PlayerSlot};

pub const BATTLESHIP_GRID: usize = 10;
/// Total occupied cells of a complete fleet (2 + 3 + 3 + 4 + 5).
pub const FLEET_CELLS: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ShipId {
    Two,
    ThreeA,
    ThreeB,
    Four,
    Five,
}

impl ShipId {
    pub const ALL: [ShipId; 5] = [
        ShipId::Two,
        ShipId::ThreeA,
        ShipId::ThreeB,
        ShipId::Four,
        ShipId::Five,
    ];

    pub fn length(self) -> usize {
        match self {
            ShipId::Two => 2,
            ShipId::ThreeA | ShipId::ThreeB => 3,
            ShipId::Four => 4,
            ShipId::Five => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Orientation {
    Right,
    Down,
}

/// One placed ship: origin cell plus orientation; the length comes from the
/// fixed per-id table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ship {
    pub id: ShipId,
    pub row: usize,
    pub col: usize,
    pub dir: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum GuessMark {
    None,
    Miss,
    Hit,
}

/// One player's half of the match: their seat, their fleet (empty until the
/// placement move), and the 10x10 record of guesses they have fired at the
/// opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BattleshipSide {
    pub player: Option<PlayerSlot>,
    pub ships: Vec<Ship>,
    pub guesses: Vec<Vec<GuessMark>>,
}

impl BattleshipSide {
    pub fn empty() -> Self {
        Self {
            player: None,
            ships: Vec::new(),
            guesses: empty_guess_grid(),
        }
    }

    pub fn fleet_placed(&self) -> bool {
        !self.ships.is_empty()
    }
}

pub fn empty_guess_grid() -> Vec<Vec<GuessMark>> {
    (0..BATTLESHIP_GRID)
        .map(|_| vec![GuessMark::None; BATTLESHIP_GRID])
        .collect()
}

/// Authoritative state of one Battleship match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BattleshipGame {
    pub sides: [BattleshipSide; 2],
    /// Seat index whose guess is currently legal.
    pub turn: usize,
    pub outcome: Outcome,
    pub created_at: String, // ISO 8601 string
}

/// A player action against a Battleship session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum BattleshipMove {
    /// Commit the full five-ship layout for the acting seat. Accepted once,
    /// before any guessing.
    PlaceFleet { ships: Vec<Ship> },
    /// Fire at a cell of the opponent's grid.
    Guess { row: usize, col: usize },
}
