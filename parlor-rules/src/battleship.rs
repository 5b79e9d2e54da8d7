use std::collections::HashSet;

use parlor_types::{
    BATTLESHIP_GRID, BattleshipGame, BattleshipMove, BattleshipSide, FLEET_CELLS, GameType,
    GuessMark, MoveRejection, Orientation, Outcome, PlayerSlot, Ship, ShipId, UserId,
};
use rand::RngCore;

use crate::machine::{GameRules, JoinOutcome, ensure_in_progress};

/// Expand a placed ship to the cells it occupies. The placement must
/// already be bounds-checked; see [`validate_fleet`].
pub fn ship_cells(ship: &Ship) -> Vec<(usize, usize)> {
    (0..ship.id.length())
        .map(|k| match ship.dir {
            Orientation::Right => (ship.row, ship.col + k),
            Orientation::Down => (ship.row + k, ship.col),
        })
        .collect()
}

fn fleet_cells(ships: &[Ship]) -> HashSet<(usize, usize)> {
    ships.iter().flat_map(ship_cells).collect()
}

/// Check a full five-ship layout: one ship per id, every cell in bounds,
/// no overlap, 17 occupied cells in total.
pub fn validate_fleet(ships: &[Ship]) -> Result<(), MoveRejection> {
    let mut ids: Vec<ShipId> = ships.iter().map(|s| s.id).collect();
    ids.sort_by_key(|id| *id as usize);
    let mut expected = ShipId::ALL;
    expected.sort_by_key(|id| *id as usize);
    if ids != expected {
        return Err(MoveRejection::FleetInvalid {
            reason: "fleet must contain each of the five ships exactly once".to_string(),
        });
    }

    let mut occupied = HashSet::new();
    for ship in ships {
        // Whole-span bounds check before expanding cells, so an origin near
        // usize::MAX can never overflow in ship_cells
        let length = ship.id.length();
        let span_in_bounds = match ship.dir {
            Orientation::Right => {
                ship.row < BATTLESHIP_GRID && ship.col <= BATTLESHIP_GRID - length
            }
            Orientation::Down => {
                ship.col < BATTLESHIP_GRID && ship.row <= BATTLESHIP_GRID - length
            }
        };
        if !span_in_bounds {
            return Err(MoveRejection::FleetInvalid {
                reason: format!("ship {:?} extends past the grid", ship.id),
            });
        }
        for (row, col) in ship_cells(ship) {
            if !occupied.insert((row, col)) {
                return Err(MoveRejection::FleetInvalid {
                    reason: format!("ship {:?} overlaps another ship", ship.id),
                });
            }
        }
    }
    debug_assert_eq!(occupied.len(), FLEET_CELLS);
    Ok(())
}

fn place_fleet(
    doc: &BattleshipGame,
    seat: usize,
    ships: &[Ship],
) -> Result<BattleshipGame, MoveRejection> {
    if doc.sides[seat].fleet_placed() {
        return Err(MoveRejection::FleetAlreadyPlaced);
    }
    validate_fleet(ships)?;
    let mut next = doc.clone();
    next.sides[seat].ships = ships.to_vec();
    Ok(next)
}

fn guess(
    doc: &BattleshipGame,
    seat: usize,
    row: usize,
    col: usize,
) -> Result<BattleshipGame, MoveRejection> {
    let opponent = 1 - seat;
    if doc.sides[opponent].player.is_none() {
        return Err(MoveRejection::OpponentMissing);
    }
    if !doc.sides[seat].fleet_placed() || !doc.sides[opponent].fleet_placed() {
        return Err(MoveRejection::FleetNotPlaced);
    }
    if doc.turn != seat {
        return Err(MoveRejection::NotYourTurn);
    }
    if row >= BATTLESHIP_GRID || col >= BATTLESHIP_GRID {
        return Err(MoveRejection::CellOutOfRange { row, col });
    }
    if doc.sides[seat].guesses[row][col] != GuessMark::None {
        return Err(MoveRejection::CellAlreadyGuessed { row, col });
    }

    let targets = fleet_cells(&doc.sides[opponent].ships);
    let hit = targets.contains(&(row, col));

    let mut next = doc.clone();
    next.sides[seat].guesses[row][col] = if hit { GuessMark::Hit } else { GuessMark::Miss };

    if hit {
        let all_sunk = targets
            .iter()
            .all(|&(r, c)| next.sides[seat].guesses[r][c] == GuessMark::Hit);
        if all_sunk {
            next.outcome = Outcome::Won { seat };
        }
    }
    next.turn = opponent;
    Ok(next)
}

pub struct BattleshipRules;

impl GameRules for BattleshipRules {
    const GAME_TYPE: GameType = GameType::Battleship;

    type Doc = BattleshipGame;
    type Move = BattleshipMove;

    fn initial(host: PlayerSlot) -> BattleshipGame {
        let mut host_side = BattleshipSide::empty();
        host_side.player = Some(host);
        BattleshipGame {
            sides: [host_side, BattleshipSide::empty()],
            turn: 0,
            outcome: Outcome::InProgress,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn outcome(doc: &BattleshipGame) -> Outcome {
        doc.outcome
    }

    fn seat_of(doc: &BattleshipGame, uid: &UserId) -> Option<usize> {
        doc.sides
            .iter()
            .position(|side| side.player.as_ref().is_some_and(|p| &p.uid == uid))
    }

    fn claim_seat(
        doc: &BattleshipGame,
        player: &PlayerSlot,
    ) -> Result<(BattleshipGame, JoinOutcome), MoveRejection> {
        if let Some(seat) = Self::seat_of(doc, &player.uid) {
            return Ok((doc.clone(), JoinOutcome::AlreadySeated(seat)));
        }
        let Some(open) = doc.sides.iter().position(|side| side.player.is_none()) else {
            return Err(MoveRejection::GameFull);
        };
        let mut next = doc.clone();
        next.sides[open].player = Some(player.clone());
        Ok((next, JoinOutcome::Seated(open)))
    }

    fn apply(
        doc: &BattleshipGame,
        seat: usize,
        mv: &BattleshipMove,
        _rng: &mut dyn RngCore,
    ) -> Result<BattleshipGame, MoveRejection> {
        ensure_in_progress(doc.outcome)?;
        if seat >= doc.sides.len() {
            return Err(MoveRejection::NotSeated);
        }
        match mv {
            BattleshipMove::PlaceFleet { ships } => place_fleet(doc, seat, ships),
            BattleshipMove::Guess { row, col } => guess(doc, seat, *row, *col),
        }
    }
}
