use parlor_types::{GameType, MoveRejection, Outcome, PlayerSlot, UserId};
use rand::RngCore;

/// Result of a seat claim against a session document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player now holds the given seat.
    Seated(usize),
    /// The player already held the given seat; nothing changed.
    AlreadySeated(usize),
}

/// The per-game rule module: one pure transition function plus the seat
/// bookkeeping the session layer needs.
///
/// Every function is a pure function of its inputs. A rejected move returns
/// the reason and leaves the input document untouched, which makes the
/// functions safe to re-run when an optimistic transaction retries.
pub trait GameRules {
    const GAME_TYPE: GameType;

    /// The authoritative session document for this game.
    type Doc: Clone + Send + Sync + 'static;
    /// A candidate move from one seated player.
    type Move: Clone + Send + Sync + 'static;

    /// Fresh session document with the host in the first seat.
    fn initial(host: PlayerSlot) -> Self::Doc;

    fn outcome(doc: &Self::Doc) -> Outcome;

    /// Seat index held by `uid`, if any.
    fn seat_of(doc: &Self::Doc, uid: &UserId) -> Option<usize>;

    /// Claim the next open seat for `player`. Claiming a seat the player
    /// already holds is a no-op, not an error.
    fn claim_seat(
        doc: &Self::Doc,
        player: &PlayerSlot,
    ) -> Result<(Self::Doc, JoinOutcome), MoveRejection>;

    /// Validate and apply one move. Randomness (Yahtzee dice) comes from the
    /// injected generator so the transition is deterministic under test.
    fn apply(
        doc: &Self::Doc,
        seat: usize,
        mv: &Self::Move,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Doc, MoveRejection>;
}

/// Shared guard: every game freezes once the outcome is terminal.
pub(crate) fn ensure_in_progress(outcome: Outcome) -> Result<(), MoveRejection> {
    if outcome.is_terminal() {
        Err(MoveRejection::GameOver)
    } else {
        Ok(())
    }
}
