use std::sync::Arc;

use parlor_sessions::Directory;
use parlor_store::{DocumentStore, MemoryStore};
use parlor_types::PlayerSlot;

/// Shared fixture: one in-memory store with a directory layered on it.
pub fn test_store() -> (Arc<dyn DocumentStore>, Directory) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let directory = Directory::new(store.clone());
    (store, directory)
}

pub fn alice() -> PlayerSlot {
    PlayerSlot::new("alice-uid", "Alice")
}

pub fn bob() -> PlayerSlot {
    PlayerSlot::new("bob-uid", "Bob")
}

pub fn carol() -> PlayerSlot {
    PlayerSlot::new("carol-uid", "Carol")
}
