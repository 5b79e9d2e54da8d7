use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{
    ChangeCallback, DocumentStore, StoreError, Subscription, TxDecision, TxFn, TxOutcome,
};

const MAX_TX_RETRIES: u32 = 5;

type Key = (String, String);
type SharedCallback = Arc<dyn Fn(&Value) + Send + Sync>;

struct VersionedDoc {
    version: u64,
    data: Value,
}

/// Reference implementation of the [`DocumentStore`] contract: versioned
/// JSON documents with real optimistic-transaction semantics, used by the
/// test suites and as the behavioral model a remote backend must match.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<Key, VersionedDoc>>,
    subscribers: Arc<Mutex<HashMap<Key, Vec<(u64, SharedCallback)>>>>,
    next_subscriber: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> Key {
        (collection.to_string(), id.to_string())
    }

    fn not_found(collection: &str, id: &str) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Deliver the committed snapshot to every subscriber of the document.
    /// Callbacks run after all locks are released so a callback can safely
    /// schedule follow-up reads.
    fn notify(&self, key: &Key, snapshot: &Value) {
        let callbacks: Vec<SharedCallback> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers
                .get(key)
                .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let docs = self.docs.read().unwrap();
        docs.get(&Self::key(collection, id))
            .map(|doc| doc.data.clone())
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn create(&self, collection: &str, doc: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut docs = self.docs.write().unwrap();
        docs.insert(
            Self::key(collection, &id),
            VersionedDoc {
                version: 1,
                data: doc,
            },
        );
        debug!(collection, id, "created document");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let key = Self::key(collection, id);
        let snapshot = {
            let mut docs = self.docs.write().unwrap();
            let entry = docs.entry(key.clone()).or_insert(VersionedDoc {
                version: 0,
                data: Value::Null,
            });
            entry.data = doc;
            entry.version += 1;
            entry.data.clone()
        };
        self.notify(&key, &snapshot);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let key = Self::key(collection, id);
        let snapshot = {
            let mut docs = self.docs.write().unwrap();
            let doc = docs
                .get_mut(&key)
                .ok_or_else(|| Self::not_found(collection, id))?;
            if let Value::Object(existing) = &mut doc.data {
                for (field, value) in fields {
                    existing.insert(field, value);
                }
            } else {
                doc.data = Value::Object(fields);
            }
            doc.version += 1;
            doc.data.clone()
        };
        self.notify(&key, &snapshot);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap();
        docs.remove(&Self::key(collection, id));
        Ok(())
    }

    async fn transact(
        &self,
        collection: &str,
        id: &str,
        apply: TxFn<'_>,
    ) -> Result<TxOutcome, StoreError> {
        let key = Self::key(collection, id);
        for attempt in 0..=MAX_TX_RETRIES {
            // Snapshot without holding a lock while the transaction
            // function runs
            let (snapshot, read_version) = {
                let docs = self.docs.read().unwrap();
                let doc = docs
                    .get(&key)
                    .ok_or_else(|| Self::not_found(collection, id))?;
                (doc.data.clone(), doc.version)
            };

            match apply(&snapshot) {
                TxDecision::Skip => {
                    return Ok(TxOutcome {
                        committed: false,
                        retries: attempt,
                    });
                }
                TxDecision::Write(new_doc) => {
                    let committed = {
                        let mut docs = self.docs.write().unwrap();
                        let doc = docs
                            .get_mut(&key)
                            .ok_or_else(|| Self::not_found(collection, id))?;
                        if doc.version == read_version {
                            doc.data = new_doc.clone();
                            doc.version += 1;
                            true
                        } else {
                            false
                        }
                    };
                    if committed {
                        self.notify(&key, &new_doc);
                        return Ok(TxOutcome {
                            committed: true,
                            retries: attempt,
                        });
                    }
                    debug!(collection, id, attempt, "transaction lost the race, retrying");
                }
            }
        }
        Err(StoreError::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
            retries: MAX_TX_RETRIES,
        })
    }

    fn subscribe(&self, collection: &str, id: &str, on_change: ChangeCallback) -> Subscription {
        let key = Self::key(collection, id);
        let callback: SharedCallback = Arc::from(on_change);
        let token = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers
                .entry(key.clone())
                .or_default()
                .push((token, callback.clone()));
        }

        // Initial snapshot, matching the push-on-registration behavior the
        // UI relies on to render the first frame
        let initial = {
            let docs = self.docs.read().unwrap();
            docs.get(&key).map(|doc| doc.data.clone())
        };
        match initial {
            Some(snapshot) => callback(&snapshot),
            None => warn!(collection, id, "subscribed to a document that does not exist"),
        }

        let registry = Arc::clone(&self.subscribers);
        Subscription::new(move || {
            let mut subscribers = registry.lock().unwrap();
            if let Some(list) = subscribers.get_mut(&key) {
                list.retain(|(t, _)| *t != token);
            }
        })
    }
}
