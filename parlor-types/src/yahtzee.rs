use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Outcome, UserId};

pub const YAHTZEE_DICE: usize = 5;
pub const YAHTZEE_MAX_ROLLS: u8 = 3;
pub const UPPER_BONUS_THRESHOLD: i32 = 63;
pub const UPPER_BONUS: i32 = 35;

/// A scorable slot on the card. `Extras` is the cumulative bonus-Yahtzee
/// house-rule slot; everything else is scored at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    Triple,
    Quadruple,
    FullHouse,
    SmallStraight,
    LargeStraight,
    Yahtzee,
    Extras,
    Chance,
}

impl Category {
    /// The thirteen ordinary categories, all of which must be filled before
    /// a player's card is complete. `Extras` is deliberately absent.
    pub const SCORABLE: [Category; 13] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::Triple,
        Category::Quadruple,
        Category::FullHouse,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yahtzee,
        Category::Chance,
    ];

    pub const UPPER: [Category; 6] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
    ];
}

/// Per-player scorecard. Every slot distinguishes "not yet scored"
/// (`None`) from "deliberately scratched for zero" (`Some(0)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Scorecard {
    pub ones: Option<i32>,
    pub twos: Option<i32>,
    pub threes: Option<i32>,
    pub fours: Option<i32>,
    pub fives: Option<i32>,
    pub sixes: Option<i32>,
    pub triple: Option<i32>,
    pub quadruple: Option<i32>,
    pub full_house: Option<i32>,
    pub small_straight: Option<i32>,
    pub large_straight: Option<i32>,
    pub yahtzee: Option<i32>,
    pub extras: Option<i32>,
    pub chance: Option<i32>,
}

impl Scorecard {
    pub fn get(&self, category: Category) -> Option<i32> {
        match category {
            Category::Ones => self.ones,
            Category::Twos => self.twos,
            Category::Threes => self.threes,
            Category::Fours => self.fours,
            Category::Fives => self.fives,
            Category::Sixes => self.sixes,
            Category::Triple => self.triple,
            Category::Quadruple => self.quadruple,
            Category::FullHouse => self.full_house,
            Category::SmallStraight => self.small_straight,
            Category::LargeStraight => self.large_straight,
            Category::Yahtzee => self.yahtzee,
            Category::Extras => self.extras,
            Category::Chance => self.chance,
        }
    }

    pub fn set(&mut self, category: Category, value: i32) {
        let slot = match category {
            Category::Ones => &mut self.ones,
            Category::Twos => &mut self.twos,
            Category::Threes => &mut self.threes,
            Category::Fours => &mut self.fours,
            Category::Fives => &mut self.fives,
            Category::Sixes => &mut self.sixes,
            Category::Triple => &mut self.triple,
            Category::Quadruple => &mut self.quadruple,
            Category::FullHouse => &mut self.full_house,
            Category::SmallStraight => &mut self.small_straight,
            Category::LargeStraight => &mut self.large_straight,
            Category::Yahtzee => &mut self.yahtzee,
            Category::Extras => &mut self.extras,
            Category::Chance => &mut self.chance,
        };
        *slot = Some(value);
    }

    /// True once all thirteen ordinary categories hold a value.
    pub fn is_complete(&self) -> bool {
        Category::SCORABLE.iter().all(|c| self.get(*c).is_some())
    }

    /// Upper-section total including the 35-point bonus at 63 or above.
    pub fn upper_total(&self) -> i32 {
        let raw: i32 = Category::UPPER
            .iter()
            .filter_map(|c| self.get(*c))
            .sum();
        if raw >= UPPER_BONUS_THRESHOLD {
            raw + UPPER_BONUS
        } else {
            raw
        }
    }

    pub fn lower_total(&self) -> i32 {
        [
            self.triple,
            self.quadruple,
            self.full_house,
            self.small_straight,
            self.large_straight,
            self.yahtzee,
            self.extras,
            self.chance,
        ]
        .iter()
        .flatten()
        .sum()
    }

    pub fn grand_total(&self) -> i32 {
        self.upper_total() + self.lower_total()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct YahtzeePlayer {
    pub uid: UserId,
    pub name: String,
    pub card: Scorecard,
}

impl YahtzeePlayer {
    pub fn new(uid: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            card: Scorecard::default(),
        }
    }
}

/// The live turn record: whose move it is, how many of the three rolls have
/// been taken, and the current die faces. Faces are 0 until the first roll
/// of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TurnState {
    pub active: usize,
    pub rolls: u8,
    pub dice: [u8; YAHTZEE_DICE],
}

impl TurnState {
    pub fn opening(active: usize) -> Self {
        Self {
            active,
            rolls: 0,
            dice: [0; YAHTZEE_DICE],
        }
    }
}

/// Authoritative state of one Yahtzee match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct YahtzeeGame {
    pub players: Vec<YahtzeePlayer>,
    /// Roster gate: until the host starts the game, new players may still
    /// join and no dice may be rolled.
    pub players_joined: bool,
    pub turn: TurnState,
    pub outcome: Outcome,
    pub created_at: String, // ISO 8601 string
}

/// A player action against a Yahtzee session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum YahtzeeMove {
    /// Close the roster; rolls become legal, joins stop.
    Start,
    /// Reroll the non-held dice. Holds are ignored on the first roll of a
    /// turn (forced full reroll).
    Roll { hold: [bool; YAHTZEE_DICE] },
    /// Record a category. `scratch` writes a deliberate zero.
    Score { category: Category, scratch: bool },
}
