use parlor_types::{
    Category, GameType, MoveRejection, Outcome, PlayerSlot, TurnState, UserId, YAHTZEE_MAX_ROLLS,
    YahtzeeGame, YahtzeeMove, YahtzeePlayer,
};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::machine::{GameRules, JoinOutcome, ensure_in_progress};

pub const FULL_HOUSE_SCORE: i32 = 25;
pub const SMALL_STRAIGHT_SCORE: i32 = 30;
pub const LARGE_STRAIGHT_SCORE: i32 = 40;
pub const YAHTZEE_SCORE: i32 = 50;
pub const EXTRAS_BONUS: i32 = 100;

/// Bonus-Yahtzee house rule: each use of the extras slot also auto-fills
/// the first still-open category in this exact order, at the listed reward.
pub const EXTRAS_AUTO_FILL: [(Category, i32); 12] = [
    (Category::Ones, 5),
    (Category::Twos, 10),
    (Category::Threes, 15),
    (Category::Fours, 20),
    (Category::Fives, 25),
    (Category::Sixes, 30),
    (Category::Triple, 30),
    (Category::Quadruple, 30),
    (Category::FullHouse, FULL_HOUSE_SCORE),
    (Category::SmallStraight, SMALL_STRAIGHT_SCORE),
    (Category::LargeStraight, LARGE_STRAIGHT_SCORE),
    (Category::Chance, 30),
];

fn face_counts(dice: [u8; 5]) -> [u8; 7] {
    let mut counts = [0u8; 7];
    for die in dice {
        if (1..=6).contains(&die) {
            counts[die as usize] += 1;
        }
    }
    counts
}

fn sum_all(dice: [u8; 5]) -> i32 {
    dice.iter().map(|&d| d as i32).sum()
}

fn longest_run(counts: &[u8; 7]) -> usize {
    let mut best = 0;
    let mut current = 0;
    for face in 1..=6 {
        if counts[face] > 0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Score one category against the current die faces. Pattern categories
/// that do not match score zero; the caller decides whether a zero is a
/// deliberate scratch.
pub fn score_category(category: Category, dice: [u8; 5]) -> i32 {
    let counts = face_counts(dice);
    match category {
        Category::Ones => counts[1] as i32,
        Category::Twos => counts[2] as i32 * 2,
        Category::Threes => counts[3] as i32 * 3,
        Category::Fours => counts[4] as i32 * 4,
        Category::Fives => counts[5] as i32 * 5,
        Category::Sixes => counts[6] as i32 * 6,
        Category::Triple => {
            if counts.iter().any(|&c| c >= 3) {
                sum_all(dice)
            } else {
                0
            }
        }
        Category::Quadruple => {
            if counts.iter().any(|&c| c >= 4) {
                sum_all(dice)
            } else {
                0
            }
        }
        Category::FullHouse => {
            let has_pair = counts.iter().any(|&c| c == 2);
            let has_triple = counts.iter().any(|&c| c == 3);
            if has_pair && has_triple {
                FULL_HOUSE_SCORE
            } else {
                0
            }
        }
        Category::SmallStraight => {
            if longest_run(&counts) >= 4 {
                SMALL_STRAIGHT_SCORE
            } else {
                0
            }
        }
        Category::LargeStraight => {
            if longest_run(&counts) >= 5 {
                LARGE_STRAIGHT_SCORE
            } else {
                0
            }
        }
        Category::Yahtzee => {
            if counts.iter().any(|&c| c == 5) {
                YAHTZEE_SCORE
            } else {
                0
            }
        }
        Category::Extras => EXTRAS_BONUS,
        Category::Chance => sum_all(dice),
    }
}

fn roll(doc: &YahtzeeGame, seat: usize, hold: [bool; 5], rng: &mut dyn RngCore) -> Result<YahtzeeGame, MoveRejection> {
    if !doc.players_joined {
        return Err(MoveRejection::RosterOpen);
    }
    if doc.turn.active != seat {
        return Err(MoveRejection::NotYourTurn);
    }
    if doc.turn.rolls >= YAHTZEE_MAX_ROLLS {
        return Err(MoveRejection::RollsExhausted);
    }

    let mut next = doc.clone();
    let first_roll = next.turn.rolls == 0;
    for (i, die) in next.turn.dice.iter_mut().enumerate() {
        // The opening roll of a turn rerolls everything regardless of holds
        if first_roll || !hold[i] {
            *die = rng.gen_range(1..=6);
        }
    }
    next.turn.rolls += 1;
    Ok(next)
}

fn score(
    doc: &YahtzeeGame,
    seat: usize,
    category: Category,
    scratch: bool,
) -> Result<YahtzeeGame, MoveRejection> {
    if !doc.players_joined {
        return Err(MoveRejection::RosterOpen);
    }
    if doc.turn.active != seat {
        return Err(MoveRejection::NotYourTurn);
    }
    if doc.turn.rolls == 0 {
        return Err(MoveRejection::NoRollsTaken);
    }

    let mut next = doc.clone();
    let dice = next.turn.dice;
    let card = &mut next.players[seat].card;

    if category == Category::Extras {
        // Cumulative house-rule slot: stack the bonus and auto-fill one
        // still-open category from the fixed priority list.
        card.extras = Some(card.extras.unwrap_or(0) + EXTRAS_BONUS);
        if let Some((open, reward)) = EXTRAS_AUTO_FILL
            .iter()
            .find(|(c, _)| card.get(*c).is_none())
        {
            debug!(category = ?open, reward, "extras auto-filled category");
            card.set(*open, *reward);
        }
    } else {
        if card.get(category).is_some() {
            return Err(MoveRejection::CategoryAlreadyScored { category });
        }
        let value = if scratch { 0 } else { score_category(category, dice) };
        card.set(category, value);
    }

    let card_complete = next.players[seat].card.is_complete();
    let last_seat = seat == next.players.len() - 1;
    if last_seat && card_complete {
        // Highest grand total wins; equal totals resolve to the earliest
        // seat (no explicit tie outcome for this game).
        let winner = next
            .players
            .iter()
            .enumerate()
            .max_by_key(|(i, p)| (p.card.grand_total(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        next.outcome = Outcome::Won { seat: winner };
    }

    next.turn = TurnState::opening((seat + 1) % next.players.len());
    Ok(next)
}

pub struct YahtzeeRules;

impl GameRules for YahtzeeRules {
    const GAME_TYPE: GameType = GameType::Yahtzee;

    type Doc = YahtzeeGame;
    type Move = YahtzeeMove;

    fn initial(host: PlayerSlot) -> YahtzeeGame {
        YahtzeeGame {
            players: vec![YahtzeePlayer::new(host.uid, host.name)],
            players_joined: false,
            turn: TurnState::opening(0),
            outcome: Outcome::InProgress,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn outcome(doc: &YahtzeeGame) -> Outcome {
        doc.outcome
    }

    fn seat_of(doc: &YahtzeeGame, uid: &UserId) -> Option<usize> {
        doc.players.iter().position(|p| &p.uid == uid)
    }

    fn claim_seat(
        doc: &YahtzeeGame,
        player: &PlayerSlot,
    ) -> Result<(YahtzeeGame, JoinOutcome), MoveRejection> {
        if let Some(seat) = Self::seat_of(doc, &player.uid) {
            return Ok((doc.clone(), JoinOutcome::AlreadySeated(seat)));
        }
        if doc.players_joined {
            return Err(MoveRejection::RosterClosed);
        }
        let mut next = doc.clone();
        next.players
            .push(YahtzeePlayer::new(player.uid.clone(), player.name.clone()));
        let seat = next.players.len() - 1;
        Ok((next, JoinOutcome::Seated(seat)))
    }

    fn apply(
        doc: &YahtzeeGame,
        seat: usize,
        mv: &YahtzeeMove,
        rng: &mut dyn RngCore,
    ) -> Result<YahtzeeGame, MoveRejection> {
        ensure_in_progress(doc.outcome)?;
        if seat >= doc.players.len() {
            return Err(MoveRejection::NotSeated);
        }
        match mv {
            YahtzeeMove::Start => {
                if seat != 0 {
                    return Err(MoveRejection::NotHost);
                }
                if doc.players_joined {
                    return Err(MoveRejection::RosterClosed);
                }
                let mut next = doc.clone();
                next.players_joined = true;
                Ok(next)
            }
            YahtzeeMove::Roll { hold } => roll(doc, seat, *hold, rng),
            YahtzeeMove::Score { category, scratch } => score(doc, seat, *category, *scratch),
        }
    }
}
