//! One-time fold of the legacy `favorites` collection into `watchlist`.

use chrono::{DateTime, Duration, Utc};
use saved_media_models::{Collection, SavedItem};
use saved_media_store::{keys, CollectionStore, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

const MIGRATED_FLAG: &str = "true";

/// Copy of the pre-migration favorites, kept for manual recovery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesBackup {
    pub items: Vec<SavedItem>,
    /// The stored favorites as found, when they did not parse cleanly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_favorites: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyMigrated,
    Migrated {
        favorites: usize,
        watchlist: usize,
        merged: usize,
    },
    /// Flag left unset; the next start tries again
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupCleanup {
    Missing,
    Retained { expires_at: DateTime<Utc> },
    Removed,
    /// Unreadable backup, removed without complaint
    RemovedCorrupt,
    /// Expired, but the store refused the removal
    RemoveFailed(String),
}

#[derive(Debug, Default)]
struct Legacy {
    items: Collection,
    /// Raw payload, kept when some of it could not be turned into items
    lossy_raw: Option<String>,
}

/// Absent or malformed means empty, but a payload that didn't parse cleanly
/// is handed back raw so it can go into the backup. I/O failures propagate.
fn read_legacy(store: &CollectionStore, key: &str) -> Result<Legacy, StorageError> {
    let Some(raw) = store.read_raw(key)? else {
        return Ok(Legacy::default());
    };
    let items = match serde_json::from_str::<Collection>(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!("Ignoring malformed {} during migration: {}", key, e);
            return Ok(Legacy {
                items: Collection::new(),
                lossy_raw: Some(raw),
            });
        }
    };

    let entries = serde_json::from_str::<Vec<Value>>(&raw).map(|values| values.len());
    if entries.ok() == Some(items.len()) {
        return Ok(Legacy { items, lossy_raw: None });
    }
    warn!("Some {} entries could not be read; keeping the original payload", key);
    Ok(Legacy {
        items,
        lossy_raw: Some(raw),
    })
}

pub fn is_migrated(store: &CollectionStore) -> Result<bool, StorageError> {
    Ok(store.read_raw(keys::FAVORITES_MIGRATED)?.as_deref() == Some(MIGRATED_FLAG))
}

fn run(store: &CollectionStore, now: DateTime<Utc>, retention: Duration) -> Result<MigrationOutcome, StorageError> {
    if is_migrated(store)? {
        debug!("Favorites already migrated");
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    let favorites = read_legacy(store, keys::FAVORITES)?;
    let watchlist = read_legacy(store, keys::WATCHLIST)?.items;
    let (favorites_count, watchlist_count) = (favorites.items.len(), watchlist.len());

    let merged = Collection::merge_last_seen_wins(favorites.items.iter().cloned().chain(watchlist));
    store.save(keys::WATCHLIST, &merged)?;

    // Favorites are only removed below once this backup holds them
    if !favorites.items.is_empty() || favorites.lossy_raw.is_some() {
        let backup = FavoritesBackup {
            items: favorites.items.into_items(),
            raw_favorites: favorites.lossy_raw,
            created_at: now,
            expires_at: now + retention,
        };
        store.write_json(keys::FAVORITES_BACKUP, &backup)?;
    }

    store.write_raw(keys::FAVORITES_MIGRATED, MIGRATED_FLAG)?;

    // The backup already holds these; a leftover key is harmless
    if let Err(e) = store.remove(keys::FAVORITES) {
        warn!("Could not remove legacy favorites after migration: {}", e);
    }

    Ok(MigrationOutcome::Migrated {
        favorites: favorites_count,
        watchlist: watchlist_count,
        merged: merged.len(),
    })
}

/// Merge `favorites` and `watchlist` into `watchlist`, once.
///
/// Later entries win on duplicate ids (watchlist over favorites). Never
/// panics or errors: failures are logged and reported as
/// [`MigrationOutcome::Failed`].
pub fn migrate(store: &CollectionStore, now: DateTime<Utc>, retention: Duration) -> MigrationOutcome {
    match run(store, now, retention) {
        Ok(outcome) => {
            if let MigrationOutcome::Migrated { favorites, watchlist, merged } = &outcome {
                info!(
                    "Migrated saved media: {} favorites + {} watchlist -> {} items",
                    favorites, watchlist, merged
                );
            }
            outcome
        }
        Err(e) => {
            warn!("Saved media migration failed, will retry on next start: {}", e);
            MigrationOutcome::Failed(e.to_string())
        }
    }
}

/// Delete the favorites backup once its retention window has passed.
pub fn cleanup_expired_backup(store: &CollectionStore, now: DateTime<Utc>) -> BackupCleanup {
    let backup = match store.read_json::<FavoritesBackup>(keys::FAVORITES_BACKUP) {
        Ok(Some(backup)) => backup,
        Ok(None) => return BackupCleanup::Missing,
        Err(e) => {
            debug!("Removing unreadable favorites backup: {}", e);
            let _ = store.remove(keys::FAVORITES_BACKUP);
            return BackupCleanup::RemovedCorrupt;
        }
    };

    if backup.expires_at > now {
        return BackupCleanup::Retained {
            expires_at: backup.expires_at,
        };
    }

    match store.remove(keys::FAVORITES_BACKUP) {
        Ok(()) => {
            info!("Removed favorites backup (expired {})", backup.expires_at);
            BackupCleanup::Removed
        }
        Err(e) => {
            warn!("Could not remove expired favorites backup: {}", e);
            BackupCleanup::RemoveFailed(e.to_string())
        }
    }
}
