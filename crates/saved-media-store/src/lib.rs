//! Local persistence for saved-media collections.
//!
//! [`KeyValueStore`] is the raw string store (a directory of files, or memory).
//! [`CollectionStore`] is the only accessor the rest of the workspace uses: it
//! owns serialization, degrades unreadable data to an empty collection, and
//! publishes a [`StorageEvent`] after every write.

pub mod collection_store;
pub mod error;
pub mod file_store;
pub mod keys;
pub mod memory_store;

pub use collection_store::{CollectionStore, StorageEvent, StorageEventKind};
pub use error::StorageError;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Synchronous string key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
