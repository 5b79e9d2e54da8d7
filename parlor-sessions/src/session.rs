use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use parlor_rules::{GameRules, JoinOutcome};
use parlor_store::{DocumentStore, StoreError, Subscription, TxDecision};
use parlor_types::{GameId, MoveRejection, PlayerSlot, UserId};

use crate::directory::Directory;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session document with id {id}")]
    NotFound { id: String },
    #[error("session document is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a validated move request. A rejection is an ordinary outcome:
/// nothing was committed and the caller should leave its view unchanged.
#[derive(Debug)]
pub enum MoveOutcome<D> {
    Applied(D),
    Rejected(MoveRejection),
}

impl<D> MoveOutcome<D> {
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }
}

/// Result of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    Seated(usize),
    AlreadySeated(usize),
    Rejected(MoveRejection),
}

enum TxCapture<D> {
    Applied(D),
    Rejected(MoveRejection),
    Corrupt(String),
}

/// The transactional wrapper around one game's pure rule module.
///
/// Every mutation is a read-validate-write optimistic transaction against
/// the injected document store: the transition function runs against a
/// snapshot and commits only if no concurrent writer got there first, so
/// at most one move lands per document version. The rule functions are
/// pure and therefore safe to re-run when the store retries.
pub struct SessionClient<R: GameRules> {
    store: Arc<dyn DocumentStore>,
    directory: Directory,
    _rules: PhantomData<R>,
}

impl<R: GameRules> SessionClient<R>
where
    R::Doc: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DocumentStore>, directory: Directory) -> Self {
        Self {
            store,
            directory,
            _rules: PhantomData,
        }
    }

    fn collection() -> &'static str {
        R::GAME_TYPE.collection()
    }

    /// Create a fresh session with the host in the first seat and register
    /// it in the host's directory record.
    pub async fn create(&self, host: PlayerSlot) -> Result<GameId, SessionError> {
        let doc = R::initial(host.clone());
        let value = serde_json::to_value(&doc).map_err(StoreError::from)?;
        let id = self.store.create(Self::collection(), value).await?;
        info!(game = ?R::GAME_TYPE, id, host = %host.uid, "session created");
        self.directory
            .record_membership(&host.uid, R::GAME_TYPE, &id)
            .await?;
        Ok(id)
    }

    /// One-shot read of the current session document. A stale or fabricated
    /// id surfaces as `NotFound`, never as a default state.
    pub async fn fetch(&self, id: &GameId) -> Result<R::Doc, SessionError> {
        let value = match self.store.get(Self::collection(), id).await {
            Ok(value) => value,
            Err(StoreError::NotFound { .. }) => {
                return Err(SessionError::NotFound { id: id.clone() });
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_value(value).map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    /// Claim the next open seat for `player`. Joining a session the player
    /// already sits in is a no-op; a full session is a rejection. A fresh
    /// seat is registered in the joiner's directory record.
    pub async fn join(&self, id: &GameId, player: &PlayerSlot) -> Result<JoinResult, SessionError> {
        let capture: Mutex<Option<TxCapture<JoinOutcome>>> = Mutex::new(None);
        let result = self
            .store
            .transact(Self::collection(), id, &|value| {
                let doc: R::Doc = match serde_json::from_value(value.clone()) {
                    Ok(doc) => doc,
                    Err(e) => {
                        *capture.lock().unwrap() = Some(TxCapture::Corrupt(e.to_string()));
                        return TxDecision::Skip;
                    }
                };
                match R::claim_seat(&doc, player) {
                    Ok((next, outcome)) => match serde_json::to_value(&next) {
                        Ok(value) => {
                            *capture.lock().unwrap() = Some(TxCapture::Applied(outcome));
                            match outcome {
                                JoinOutcome::Seated(_) => TxDecision::Write(value),
                                JoinOutcome::AlreadySeated(_) => TxDecision::Skip,
                            }
                        }
                        Err(e) => {
                            *capture.lock().unwrap() = Some(TxCapture::Corrupt(e.to_string()));
                            TxDecision::Skip
                        }
                    },
                    Err(rejection) => {
                        *capture.lock().unwrap() = Some(TxCapture::Rejected(rejection));
                        TxDecision::Skip
                    }
                }
            })
            .await;
        self.map_store_result(id, result)?;

        match capture.into_inner().unwrap() {
            Some(TxCapture::Applied(JoinOutcome::Seated(seat))) => {
                info!(game = ?R::GAME_TYPE, id, player = %player.uid, seat, "player joined session");
                self.directory
                    .record_membership(&player.uid, R::GAME_TYPE, id)
                    .await?;
                Ok(JoinResult::Seated(seat))
            }
            Some(TxCapture::Applied(JoinOutcome::AlreadySeated(seat))) => {
                Ok(JoinResult::AlreadySeated(seat))
            }
            Some(TxCapture::Rejected(rejection)) => Ok(JoinResult::Rejected(rejection)),
            Some(TxCapture::Corrupt(e)) => Err(SessionError::Corrupt(e)),
            None => Err(SessionError::Corrupt(
                "join transaction produced no result".to_string(),
            )),
        }
    }

    /// Validate and commit one move. The pure transition runs against each
    /// snapshot the store hands it; on commit conflict the store re-runs it
    /// against the fresh version, so at most one move is committed per
    /// invocation.
    pub async fn submit_move(
        &self,
        id: &GameId,
        uid: &UserId,
        mv: &R::Move,
    ) -> Result<MoveOutcome<R::Doc>, SessionError> {
        let capture: Mutex<Option<TxCapture<R::Doc>>> = Mutex::new(None);
        let result = self
            .store
            .transact(Self::collection(), id, &|value| {
                let doc: R::Doc = match serde_json::from_value(value.clone()) {
                    Ok(doc) => doc,
                    Err(e) => {
                        *capture.lock().unwrap() = Some(TxCapture::Corrupt(e.to_string()));
                        return TxDecision::Skip;
                    }
                };
                let Some(seat) = R::seat_of(&doc, uid) else {
                    *capture.lock().unwrap() = Some(TxCapture::Rejected(MoveRejection::NotSeated));
                    return TxDecision::Skip;
                };
                let mut rng = rand::thread_rng();
                match R::apply(&doc, seat, mv, &mut rng) {
                    Ok(next) => match serde_json::to_value(&next) {
                        Ok(value) => {
                            *capture.lock().unwrap() = Some(TxCapture::Applied(next));
                            TxDecision::Write(value)
                        }
                        Err(e) => {
                            *capture.lock().unwrap() = Some(TxCapture::Corrupt(e.to_string()));
                            TxDecision::Skip
                        }
                    },
                    Err(rejection) => {
                        *capture.lock().unwrap() = Some(TxCapture::Rejected(rejection));
                        TxDecision::Skip
                    }
                }
            })
            .await;
        self.map_store_result(id, result)?;

        match capture.into_inner().unwrap() {
            Some(TxCapture::Applied(doc)) => Ok(MoveOutcome::Applied(doc)),
            Some(TxCapture::Rejected(rejection)) => {
                debug!(game = ?R::GAME_TYPE, id, player = %uid, %rejection, "move rejected");
                Ok(MoveOutcome::Rejected(rejection))
            }
            Some(TxCapture::Corrupt(e)) => Err(SessionError::Corrupt(e)),
            None => Err(SessionError::Corrupt(
                "move transaction produced no result".to_string(),
            )),
        }
    }

    /// Live updates: `on_update` receives a fully decoded snapshot after
    /// every committed change (and once on registration). Snapshots that
    /// fail to decode are logged and skipped rather than delivered broken.
    /// The callback must not issue writes synchronously.
    pub fn subscribe(
        &self,
        id: &GameId,
        on_update: impl Fn(R::Doc) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe(
            Self::collection(),
            id,
            Box::new(move |value| match serde_json::from_value::<R::Doc>(value.clone()) {
                Ok(doc) => on_update(doc),
                Err(e) => warn!(error = %e, "skipping malformed session snapshot"),
            }),
        )
    }

    fn map_store_result<T>(
        &self,
        id: &GameId,
        result: Result<T, StoreError>,
    ) -> Result<T, SessionError> {
        match result {
            Ok(value) => Ok(value),
            Err(StoreError::NotFound { .. }) => Err(SessionError::NotFound { id: id.clone() }),
            Err(e) => Err(e.into()),
        }
    }
}
