use parlor_types::{
    CONNECT_COLUMNS, CONNECT_ROWS, ConnectColumn, ConnectGame, ConnectPiece, GameType,
    MoveRejection, Outcome, PlayerSlot, UserId,
};
use rand::RngCore;

use crate::machine::{GameRules, JoinOutcome, ensure_in_progress};

const BOARD_CAPACITY: usize = CONNECT_COLUMNS * CONNECT_ROWS;

fn cell(board: &[ConnectColumn], column: usize, row: usize) -> Option<ConnectPiece> {
    board.get(column).and_then(|c| c.get(row))
}

fn run_of_four(
    board: &[ConnectColumn],
    piece: ConnectPiece,
    start: (usize, usize),
    step: (isize, isize),
) -> bool {
    (0..4).all(|k| {
        let column = start.0 as isize + step.0 * k;
        let row = start.1 as isize + step.1 * k;
        cell(board, column as usize, row as usize) == Some(piece)
    })
}

/// Whole-board scan for four consecutive same-owner discs in any of the
/// four directions. Every anchor cell is checked once; there is no shortcut
/// keyed off the most recent drop.
pub fn detect_win(board: &[ConnectColumn], piece: ConnectPiece) -> bool {
    // Verticals
    for i in 0..CONNECT_COLUMNS {
        for j in 0..CONNECT_ROWS - 3 {
            if run_of_four(board, piece, (i, j), (0, 1)) {
                return true;
            }
        }
    }
    // Horizontals
    for i in 0..CONNECT_COLUMNS - 3 {
        for j in 0..CONNECT_ROWS {
            if run_of_four(board, piece, (i, j), (1, 0)) {
                return true;
            }
        }
    }
    // Diagonal up-right
    for i in 0..CONNECT_COLUMNS - 3 {
        for j in 0..CONNECT_ROWS - 3 {
            if run_of_four(board, piece, (i, j), (1, 1)) {
                return true;
            }
        }
    }
    // Diagonal down-right
    for i in 3..CONNECT_COLUMNS {
        for j in 0..CONNECT_ROWS - 3 {
            if run_of_four(board, piece, (i, j), (-1, 1)) {
                return true;
            }
        }
    }
    false
}

/// A board with all 42 cells filled and no winner is a tie.
pub fn detect_tie(board: &[ConnectColumn]) -> bool {
    board.iter().map(|c| c.height()).sum::<usize>() >= BOARD_CAPACITY
}

/// Derived status line shown over the board, from the point of view of the
/// given seat (`None` = spectator).
pub fn status_message(game: &ConnectGame, viewer: Option<ConnectPiece>) -> String {
    let Some(piece) = viewer else {
        return match game.outcome {
            Outcome::Won { seat: 0 } => "PLAYER 1 WON".to_string(),
            Outcome::Won { seat: _ } => "PLAYER 2 WON".to_string(),
            Outcome::Tie => "TIE".to_string(),
            Outcome::InProgress => "SPECTATING".to_string(),
        };
    };
    match game.outcome {
        Outcome::Tie => "TIE".to_string(),
        Outcome::Won { seat } if seat == piece.seat() => "YOU WON".to_string(),
        Outcome::Won { .. } => "YOU LOST".to_string(),
        Outcome::InProgress => {
            if game.players[1].is_none() {
                "WAITING FOR OPPONENT".to_string()
            } else if game.turn == piece {
                "YOUR TURN".to_string()
            } else {
                "OPPONENT'S TURN".to_string()
            }
        }
    }
}

pub struct ConnectRules;

impl GameRules for ConnectRules {
    const GAME_TYPE: GameType = GameType::Connect;

    type Doc = ConnectGame;
    /// Column index 0..=6.
    type Move = usize;

    fn initial(host: PlayerSlot) -> ConnectGame {
        ConnectGame {
            players: [Some(host), None],
            board: ConnectGame::empty_board(),
            turn: ConnectPiece::One,
            outcome: Outcome::InProgress,
            last_column: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn outcome(doc: &ConnectGame) -> Outcome {
        doc.outcome
    }

    fn seat_of(doc: &ConnectGame, uid: &UserId) -> Option<usize> {
        doc.players
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|p| &p.uid == uid))
    }

    fn claim_seat(
        doc: &ConnectGame,
        player: &PlayerSlot,
    ) -> Result<(ConnectGame, JoinOutcome), MoveRejection> {
        if let Some(seat) = Self::seat_of(doc, &player.uid) {
            return Ok((doc.clone(), JoinOutcome::AlreadySeated(seat)));
        }
        let Some(open) = doc.players.iter().position(|slot| slot.is_none()) else {
            return Err(MoveRejection::GameFull);
        };
        let mut next = doc.clone();
        next.players[open] = Some(player.clone());
        Ok((next, JoinOutcome::Seated(open)))
    }

    fn apply(
        doc: &ConnectGame,
        seat: usize,
        column: &usize,
        _rng: &mut dyn RngCore,
    ) -> Result<ConnectGame, MoveRejection> {
        let column = *column;
        ensure_in_progress(doc.outcome)?;
        let piece = ConnectPiece::from_seat(seat).ok_or(MoveRejection::NotSeated)?;
        if doc.players[1].is_none() {
            return Err(MoveRejection::OpponentMissing);
        }
        if doc.turn != piece {
            return Err(MoveRejection::NotYourTurn);
        }
        if column >= CONNECT_COLUMNS {
            return Err(MoveRejection::ColumnOutOfRange { column });
        }
        if doc.board[column].is_full() {
            return Err(MoveRejection::ColumnFull { column });
        }

        let mut next = doc.clone();
        next.board[column].push(piece);
        next.last_column = Some(column);
        if detect_win(&next.board, piece) {
            next.outcome = Outcome::Won { seat };
        } else if detect_tie(&next.board) {
            next.outcome = Outcome::Tie;
        }
        next.turn = piece.opponent();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn two_player_game() -> ConnectGame {
        let mut game = ConnectRules::initial(PlayerSlot::new("alice-uid", "Alice"));
        let (game, seated) =
            ConnectRules::claim_seat(&game, &PlayerSlot::new("bob-uid", "Bob")).unwrap();
        assert_eq!(seated, JoinOutcome::Seated(1));
        game
    }

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    fn drop(game: &ConnectGame, seat: usize, column: usize) -> ConnectGame {
        ConnectRules::apply(game, seat, &column, &mut rng()).unwrap()
    }

    /// Brute-force rescan used to cross-check `detect_win` after every move.
    fn brute_force_win(board: &[ConnectColumn], piece: ConnectPiece) -> bool {
        let dirs = [(0isize, 1isize), (1, 0), (1, 1), (1, -1)];
        for i in 0..CONNECT_COLUMNS as isize {
            for j in 0..CONNECT_ROWS as isize {
                for (di, dj) in dirs {
                    if (0..4).all(|k| {
                        let (x, y) = (i + di * k, j + dj * k);
                        x >= 0
                            && y >= 0
                            && cell(board, x as usize, y as usize) == Some(piece)
                    }) {
                        return true;
                    }
                }
            }
        }
        false
    }

    #[test]
    fn test_move_requires_second_player() {
        let game = ConnectRules::initial(PlayerSlot::new("alice-uid", "Alice"));
        let result = ConnectRules::apply(&game, 0, &3, &mut rng());
        assert_eq!(result.unwrap_err(), MoveRejection::OpponentMissing);
    }

    #[test]
    fn test_turn_alternation_enforced() {
        let game = two_player_game();
        let game = drop(&game, 0, 3);
        let result = ConnectRules::apply(&game, 0, &3, &mut rng());
        assert_eq!(result.unwrap_err(), MoveRejection::NotYourTurn);
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        let game = two_player_game();
        let result = ConnectRules::apply(&game, 0, &7, &mut rng());
        assert_eq!(result.unwrap_err(), MoveRejection::ColumnOutOfRange { column: 7 });
    }

    #[test]
    fn test_full_column_rejected() {
        let mut game = two_player_game();
        // Fill column 0 with six alternating discs
        for turn in 0..6 {
            game = drop(&game, turn % 2, 0);
        }
        assert_eq!(game.board[0].height(), 6);
        let result = ConnectRules::apply(&game, 0, &0, &mut rng());
        assert_eq!(result.unwrap_err(), MoveRejection::ColumnFull { column: 0 });
    }

    #[test]
    fn test_vertical_win_and_freeze() {
        let mut game = two_player_game();
        // Alice stacks column 3, Bob stacks column 4
        for _ in 0..3 {
            game = drop(&game, 0, 3);
            game = drop(&game, 1, 4);
        }
        game = drop(&game, 0, 3);
        assert_eq!(game.outcome, Outcome::Won { seat: 0 });

        // Any further move from either seat is rejected unchanged
        for seat in 0..2 {
            let result = ConnectRules::apply(&game, seat, &5, &mut rng());
            assert_eq!(result.unwrap_err(), MoveRejection::GameOver);
        }
    }

    #[test]
    fn test_diagonal_wins_detected() {
        // Staircase for piece one: columns 0..=3 with heights 1..=4
        let mut board = ConnectGame::empty_board();
        for (col, height) in [(0usize, 0usize), (1, 1), (2, 2), (3, 3)] {
            for _ in 0..height {
                board[col].push(ConnectPiece::Two);
            }
            board[col].push(ConnectPiece::One);
        }
        assert!(detect_win(&board, ConnectPiece::One));
        assert!(!detect_win(&board, ConnectPiece::Two));
    }

    #[test]
    fn test_win_scan_matches_brute_force_over_a_game() {
        let mut game = two_player_game();
        let script = [3, 4, 3, 4, 2, 5, 1, 6, 0, 0, 5, 2, 6, 1];
        let mut seat = 0;
        for column in script {
            let Ok(next) = ConnectRules::apply(&game, seat, &column, &mut rng()) else {
                break; // terminal reached mid-script
            };
            game = next;
            for piece in [ConnectPiece::One, ConnectPiece::Two] {
                assert_eq!(
                    detect_win(&game.board, piece),
                    brute_force_win(&game.board, piece)
                );
            }
            for column in &game.board {
                assert!(column.height() <= CONNECT_ROWS);
            }
            seat = 1 - seat;
        }
    }

    #[test]
    fn test_tie_detection() {
        // Full board with no four-in-a-row in any direction: ownership by
        // (col + 2*row) mod 4 gives maximum runs of two everywhere.
        let mut board = ConnectGame::empty_board();
        for col in 0..CONNECT_COLUMNS {
            for row in 0..CONNECT_ROWS {
                let one = (col + 2 * row) % 4 < 2;
                board[col].push(if one { ConnectPiece::One } else { ConnectPiece::Two });
            }
        }
        assert!(!detect_win(&board, ConnectPiece::One));
        assert!(!detect_win(&board, ConnectPiece::Two));
        assert!(detect_tie(&board));
    }

    #[test]
    fn test_status_messages() {
        let mut game = ConnectRules::initial(PlayerSlot::new("alice-uid", "Alice"));
        assert_eq!(
            status_message(&game, Some(ConnectPiece::One)),
            "WAITING FOR OPPONENT"
        );
        assert_eq!(status_message(&game, None), "SPECTATING");

        let (joined, _) =
            ConnectRules::claim_seat(&game, &PlayerSlot::new("bob-uid", "Bob")).unwrap();
        game = joined;
        assert_eq!(status_message(&game, Some(ConnectPiece::One)), "YOUR TURN");
        assert_eq!(
            status_message(&game, Some(ConnectPiece::Two)),
            "OPPONENT'S TURN"
        );

        game.outcome = Outcome::Won { seat: 0 };
        assert_eq!(status_message(&game, Some(ConnectPiece::One)), "YOU WON");
        assert_eq!(status_message(&game, Some(ConnectPiece::Two)), "YOU LOST");
        assert_eq!(status_message(&game, None), "PLAYER 1 WON");
    }

    #[test]
    fn test_join_is_idempotent_and_bounded() {
        let game = two_player_game();
        let bob = PlayerSlot::new("bob-uid", "Bob");
        let (unchanged, outcome) = ConnectRules::claim_seat(&game, &bob).unwrap();
        assert_eq!(outcome, JoinOutcome::AlreadySeated(1));
        assert_eq!(unchanged.players, game.players);

        let carol = PlayerSlot::new("carol-uid", "Carol");
        let result = ConnectRules::claim_seat(&game, &carol);
        assert_eq!(result.unwrap_err(), MoveRejection::GameFull);
    }
}
