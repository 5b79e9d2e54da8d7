use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use parlor_store::{DocumentStore, StoreError, Subscription, TxDecision};
use parlor_types::{GameId, GameRef, GameType, UserId, UserRecord};

use crate::session::SessionError;

const USERS_COLLECTION: &str = "users";

/// Per-user roster of joined games and pending invites, mutated only under
/// the store's optimistic-transaction discipline. The lists are append-only
/// within a transaction; invite acceptance is the one remove, expressed as
/// a full-list replace so concurrent invite arrivals are never lost.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn DocumentStore>,
}

impl Directory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the record at first authentication. Overwrites any stale
    /// record under the same uid.
    pub async fn create_record(
        &self,
        uid: &UserId,
        name: &str,
        is_anonymous: bool,
    ) -> Result<UserRecord, SessionError> {
        let record = UserRecord {
            uid: uid.clone(),
            name: name.to_string(),
            is_anonymous,
            wins: 0,
            games: Vec::new(),
            invites: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let value = serde_json::to_value(&record).map_err(StoreError::from)?;
        self.store.set(USERS_COLLECTION, uid, value).await?;
        info!(uid = %uid, is_anonymous, "created user record");
        Ok(record)
    }

    pub async fn fetch(&self, uid: &UserId) -> Result<UserRecord, SessionError> {
        let value = match self.store.get(USERS_COLLECTION, uid).await {
            Ok(value) => value,
            Err(StoreError::NotFound { .. }) => {
                return Err(SessionError::NotFound { id: uid.clone() });
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_value(value).map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    /// Remove the record entirely. Only performed when an anonymous session
    /// signs out; named accounts keep their record.
    pub async fn delete_record(&self, uid: &UserId) -> Result<(), SessionError> {
        self.store.delete(USERS_COLLECTION, uid).await?;
        info!(uid = %uid, "deleted user record");
        Ok(())
    }

    pub async fn update_display_name(
        &self,
        uid: &UserId,
        name: &str,
    ) -> Result<(), SessionError> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(name));
        self.store.update(USERS_COLLECTION, uid, fields).await?;
        Ok(())
    }

    /// Append a game to the user's roster unless an identical entry is
    /// already present.
    pub async fn record_membership(
        &self,
        uid: &UserId,
        game: GameType,
        game_id: &GameId,
    ) -> Result<(), SessionError> {
        let entry = serde_json::to_value(GameRef {
            game,
            id: game_id.clone(),
        })
        .map_err(StoreError::from)?;
        self.append_unless_present(uid, "games", entry).await
    }

    /// Deliver an invite into the user's pending list.
    pub async fn send_invite(
        &self,
        uid: &UserId,
        game: GameType,
        game_id: &GameId,
    ) -> Result<(), SessionError> {
        let entry = serde_json::to_value(GameRef {
            game,
            id: game_id.clone(),
        })
        .map_err(StoreError::from)?;
        self.append_unless_present(uid, "invites", entry).await
    }

    /// Remove the invite for `game_id` from the pending list. Accepting an
    /// invite that is no longer pending is a no-op, not an error.
    pub async fn accept_invite(&self, uid: &UserId, game_id: &GameId) -> Result<(), SessionError> {
        let result = self
            .store
            .transact(USERS_COLLECTION, uid, &|doc| {
                let invites = doc.get("invites").and_then(Value::as_array);
                let Some(invites) = invites else {
                    warn!(uid = %uid, "user record has no invites list");
                    return TxDecision::Skip;
                };
                let remaining: Vec<Value> = invites
                    .iter()
                    .filter(|entry| entry.get("id").and_then(Value::as_str) != Some(game_id))
                    .cloned()
                    .collect();
                if remaining.len() == invites.len() {
                    return TxDecision::Skip;
                }
                let mut next = doc.clone();
                if let Value::Object(map) = &mut next {
                    map.insert("invites".to_string(), Value::Array(remaining));
                    TxDecision::Write(next)
                } else {
                    TxDecision::Skip
                }
            })
            .await;
        self.map_user_result(uid, result)?;
        Ok(())
    }

    /// Bump the cumulative win counter. Deliberately a plain field update
    /// rather than a transaction: `wins` is disjoint from the list fields,
    /// so a race with a concurrent append is benign.
    pub async fn record_win(&self, uid: &UserId) -> Result<(), SessionError> {
        let record = self.fetch(uid).await?;
        let mut fields = Map::new();
        fields.insert("wins".to_string(), json!(record.wins + 1));
        self.store.update(USERS_COLLECTION, uid, fields).await?;
        Ok(())
    }

    /// Live directory updates for the signed-in user's profile view.
    pub fn subscribe(
        &self,
        uid: &UserId,
        on_update: impl Fn(UserRecord) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe(
            USERS_COLLECTION,
            uid,
            Box::new(
                move |value| match serde_json::from_value::<UserRecord>(value.clone()) {
                    Ok(record) => on_update(record),
                    Err(e) => warn!(error = %e, "skipping malformed user record snapshot"),
                },
            ),
        )
    }

    async fn append_unless_present(
        &self,
        uid: &UserId,
        field: &str,
        entry: Value,
    ) -> Result<(), SessionError> {
        let result = self
            .store
            .transact(USERS_COLLECTION, uid, &|doc| {
                let existing = doc.get(field).and_then(Value::as_array);
                let Some(existing) = existing else {
                    warn!(uid = %uid, field, "user record is missing the list field");
                    return TxDecision::Skip;
                };
                if existing.contains(&entry) {
                    return TxDecision::Skip;
                }
                let mut updated = existing.clone();
                updated.push(entry.clone());
                let mut next = doc.clone();
                if let Value::Object(map) = &mut next {
                    map.insert(field.to_string(), Value::Array(updated));
                    TxDecision::Write(next)
                } else {
                    TxDecision::Skip
                }
            })
            .await;
        self.map_user_result(uid, result)?;
        Ok(())
    }

    fn map_user_result<T>(
        &self,
        uid: &UserId,
        result: Result<T, StoreError>,
    ) -> Result<T, SessionError> {
        match result {
            Ok(value) => Ok(value),
            Err(StoreError::NotFound { .. }) => Err(SessionError::NotFound { id: uid.clone() }),
            Err(e) => Err(e.into()),
        }
    }
}
