use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no document {id} in collection {collection}")]
    NotFound { collection: String, id: String },
    #[error("transaction on {collection}/{id} still conflicted after {retries} retries")]
    Conflict {
        collection: String,
        id: String,
        retries: u32,
    },
    #[error("document failed to serialize: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What a transaction function wants done with the document it was shown.
pub enum TxDecision {
    /// Replace the document with this value.
    Write(Value),
    /// Commit nothing; the document stays as read.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub committed: bool,
    /// How many times the transaction function was re-run after losing a
    /// race to a concurrent writer.
    pub retries: u32,
}

pub type TxFn<'a> = &'a (dyn Fn(&Value) -> TxDecision + Send + Sync);
pub type ChangeCallback = Box<dyn Fn(&Value) + Send + Sync>;

/// Live-update registration. Dropping the guard unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// The contract the rule engine needs from a keyed-document backend.
///
/// Documents are opaque JSON values versioned per id. `transact` is the
/// only read-modify-write primitive: the supplied function runs against a
/// snapshot and its write commits only if no concurrent writer touched the
/// document since the read; on conflict the function is re-run against the
/// new version, so it must be safe to invoke more than once.
///
/// Change callbacks always receive a fully committed snapshot, never a
/// partial write, and must not issue writes synchronously from within the
/// notification.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    /// Insert a new document under a store-minted id.
    async fn create(&self, collection: &str, doc: Value) -> Result<String, StoreError>;

    /// Write a document under a caller-chosen id, replacing any existing
    /// content (user records are keyed by the identity provider's uid).
    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Merge the given fields into an existing document.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Remove a document. Removing an absent document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Optimistic read-compute-write against a single document.
    async fn transact(
        &self,
        collection: &str,
        id: &str,
        apply: TxFn<'_>,
    ) -> Result<TxOutcome, StoreError>;

    /// Register for push snapshots: the current document immediately (when
    /// it exists) and every committed change afterwards.
    fn subscribe(&self, collection: &str, id: &str, on_change: ChangeCallback) -> Subscription;
}
