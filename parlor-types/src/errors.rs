use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::yahtzee::Category;

/// Why a candidate move was refused. Rejections are ordinary data, not
/// faults: the session layer commits nothing and the caller's view of the
/// game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MoveRejection {
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("player holds no seat in this session")]
    NotSeated,
    #[error("the session already has a terminal outcome")]
    GameOver,
    #[error("all seats are already claimed")]
    GameFull,
    #[error("the second seat is still unclaimed")]
    OpponentMissing,
    #[error("column {column} is out of range")]
    ColumnOutOfRange { column: usize },
    #[error("column {column} already holds six discs")]
    ColumnFull { column: usize },
    #[error("the roster has not been finalized yet")]
    RosterOpen,
    #[error("the roster is already closed")]
    RosterClosed,
    #[error("only the host may finalize the roster")]
    NotHost,
    #[error("all three rolls of this turn have been used; score first")]
    RollsExhausted,
    #[error("no dice have been rolled this turn")]
    NoRollsTaken,
    #[error("category {category:?} is already scored")]
    CategoryAlreadyScored { category: Category },
    #[error("this seat's fleet is already placed")]
    FleetAlreadyPlaced,
    #[error("both fleets must be placed before guessing")]
    FleetNotPlaced,
    #[error("fleet layout is invalid: {reason}")]
    FleetInvalid { reason: String },
    #[error("cell ({row}, {col}) is out of range")]
    CellOutOfRange { row: usize, col: usize },
    #[error("cell ({row}, {col}) was already guessed")]
    CellAlreadyGuessed { row: usize, col: usize },
}
