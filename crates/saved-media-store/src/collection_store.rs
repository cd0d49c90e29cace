use crate::{KeyValueStore, StorageError};
use saved_media_models::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEventKind {
    Written,
    Removed,
}

/// Published after every successful write or removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub kind: StorageEventKind,
}

/// Single accessor for everything the client keeps in local storage.
///
/// Writes are last-writer-wins: there is no locking between processes
/// sharing the same store.
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorageEvent>,
}

impl CollectionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { backend, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Load a collection. Absent, unreadable or non-list data all yield an
    /// empty collection; the last two are logged. Single bad entries are
    /// skipped while the rest load.
    pub fn load(&self, key: &str) -> Collection {
        match self.read_json::<Collection>(key) {
            Ok(Some(collection)) => {
                debug!("Loaded {} ({} items)", key, collection.len());
                collection
            }
            Ok(None) => Collection::new(),
            Err(e) => {
                warn!("Treating {} as empty: {}", key, e);
                Collection::new()
            }
        }
    }

    pub fn save(&self, key: &str, collection: &Collection) -> Result<(), StorageError> {
        self.write_json(key, collection)?;
        debug!("Saved {} ({} items)", key, collection.len());
        Ok(())
    }

    pub fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key)
    }

    pub fn write_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set(key, value)?;
        self.publish(key, StorageEventKind::Written);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)?;
        self.publish(key, StorageEventKind::Removed);
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write_raw(key, &json)
    }

    fn publish(&self, key: &str, kind: StorageEventKind) {
        // No subscribers is the common case
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            kind,
        });
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keys, MemoryStore};
    use saved_media_models::SavedItem;

    fn store() -> CollectionStore {
        CollectionStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_load_absent_is_empty() {
        assert!(store().load(keys::WATCHLIST).is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let store = store();
        store.write_raw(keys::WATCHLIST, "{not json").unwrap();
        assert!(store.load(keys::WATCHLIST).is_empty());

        store.write_raw(keys::WATCHLIST, r#"{"id": 1}"#).unwrap();
        assert!(store.load(keys::WATCHLIST).is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_order() {
        let store = store();
        let collection = Collection::from_items(vec![
            SavedItem::new(9, "nine", "Nine"),
            SavedItem::new(5, "five", "Five"),
        ]);
        store.save(keys::WATCHLIST, &collection).unwrap();

        let loaded = store.load(keys::WATCHLIST);
        assert_eq!(loaded, collection);
    }

    #[test]
    fn test_writes_publish_events() {
        let store = store();
        let mut events = store.subscribe();

        store.save(keys::WATCHLIST, &Collection::new()).unwrap();
        store.remove(keys::FAVORITES).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            StorageEvent { key: keys::WATCHLIST.to_string(), kind: StorageEventKind::Written }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            StorageEvent { key: keys::FAVORITES.to_string(), kind: StorageEventKind::Removed }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_read_json_reports_malformed() {
        let store = store();
        store.write_raw(keys::FAVORITES_BACKUP, "oops").unwrap();
        let result = store.read_json::<serde_json::Value>(keys::FAVORITES_BACKUP);
        assert!(matches!(result, Err(StorageError::Malformed { .. })));
    }
}
