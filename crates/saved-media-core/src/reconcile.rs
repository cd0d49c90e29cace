//! Keeps the in-memory watchlist, the local store and the backend in step.
//!
//! A toggle never touches the collection until its authoritative answer is
//! known: the backend's `added` flag when signed in, the local negation for
//! guests. Each toggle draws a sequence number and only the newest toggle per
//! item may write its answer, so a slow response can't undo a faster, later
//! one. Superseded answers are still remembered: if the newer toggle then
//! fails, the newest answer the server did confirm is applied instead.

use crate::error::ReconcileError;
use saved_media_backend::{BackendError, SavedMediaApi};
use saved_media_models::{Collection, ItemKey, SavedItem};
use saved_media_store::{keys, CollectionStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Read side of the watchlist, as shown to users
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistState {
    pub items: Collection,
    pub loading: bool,
    /// Last hydrate failure, cleared by the next successful one
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Membership reported for this toggle
    pub added: bool,
    /// False when a newer toggle for the same item superseded this one
    pub applied: bool,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    Replaced { count: usize },
    /// No credential; the local collection stays as it is
    Guest,
}

/// Newest answer the backend confirmed for one item
#[derive(Debug, Clone)]
struct Confirmed {
    sequence: u64,
    item: SavedItem,
    added: bool,
}

struct Inner {
    state: WatchlistState,
    latest: HashMap<ItemKey, u64>,
    confirmed: HashMap<ItemKey, Confirmed>,
}

impl Inner {
    fn record_confirmed(&mut self, key: &ItemKey, sequence: u64, item: &SavedItem, added: bool) {
        let newer = self
            .confirmed
            .get(key)
            .map_or(true, |confirmed| confirmed.sequence < sequence);
        if newer {
            self.confirmed.insert(
                key.clone(),
                Confirmed {
                    sequence,
                    item: item.clone(),
                    added,
                },
            );
        }
    }
}

pub struct Reconciler {
    api: Arc<dyn SavedMediaApi>,
    store: CollectionStore,
    inner: Mutex<Inner>,
    next_sequence: AtomicU64,
}

impl Reconciler {
    /// Starts from whatever the local store currently holds.
    pub fn new(api: Arc<dyn SavedMediaApi>, store: CollectionStore) -> Self {
        let items = store.load(keys::WATCHLIST);
        Self {
            api,
            store,
            inner: Mutex::new(Inner {
                state: WatchlistState {
                    items,
                    ..WatchlistState::default()
                },
                latest: HashMap::new(),
                confirmed: HashMap::new(),
            }),
            next_sequence: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> WatchlistState {
        self.lock().state.clone()
    }

    pub fn items(&self) -> Collection {
        self.lock().state.items.clone()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.lock().state.items.contains(key)
    }

    /// Re-read the local store, e.g. after another process wrote to it.
    pub fn reload(&self) {
        let items = self.store.load(keys::WATCHLIST);
        self.lock().state.items = items;
    }

    /// Drop the local copy (memory and store).
    pub fn clear_local(&self) -> Result<(), ReconcileError> {
        self.store.remove(keys::WATCHLIST)?;
        let mut inner = self.lock();
        inner.state.items = Collection::new();
        inner.confirmed.clear();
        Ok(())
    }

    /// Add the item if absent, remove it if present.
    pub async fn toggle(&self, item: SavedItem) -> Result<ToggleOutcome, ReconcileError> {
        let key = item.key();

        let (sequence, previous, added) = if self.api.is_authenticated() {
            let Some(movie_id) = item.id else {
                return Err(ReconcileError::Unreconcilable(item.slug.clone()));
            };
            let (sequence, previous) = self.issue(&key);
            match self.api.toggle_watchlist(movie_id).await {
                Ok(response) => (sequence, previous, response.added),
                Err(e) => {
                    warn!("Toggle for {} failed: {}", key, e);
                    self.release(&key, sequence, previous);
                    return Err(e.into());
                }
            }
        } else {
            let (sequence, previous) = self.issue(&key);
            let added = !self.contains(&key);
            debug!("Guest toggle for {}: added={}", key, added);
            (sequence, previous, added)
        };

        let mut inner = self.lock();
        inner.record_confirmed(&key, sequence, &item, added);
        if inner.latest.get(&key) != Some(&sequence) {
            debug!("Discarding stale toggle #{} for {}", sequence, key);
            return Ok(ToggleOutcome {
                added,
                applied: false,
                sequence,
            });
        }

        let mut next = inner.state.items.clone();
        next.apply_membership(item, added);
        if let Err(e) = self.store.save(keys::WATCHLIST, &next) {
            // Leave the collection as it was so memory and store agree
            self.restore_latest(&mut inner, &key, sequence, previous);
            return Err(e.into());
        }
        inner.state.items = next;
        info!("{} {} (#{})", if added { "Saved" } else { "Removed" }, key, sequence);

        Ok(ToggleOutcome {
            added,
            applied: true,
            sequence,
        })
    }

    /// Replace the local collection with the backend's.
    ///
    /// On failure the stale collection stays visible and the error is kept
    /// in [`WatchlistState::error`].
    pub async fn hydrate(&self) -> Result<HydrateOutcome, ReconcileError> {
        if !self.api.is_authenticated() {
            debug!("Skipping hydrate: no credential");
            return Ok(HydrateOutcome::Guest);
        }

        self.lock().state.loading = true;
        let fetched = self.api.fetch_watchlist().await;

        let mut inner = self.lock();
        inner.state.loading = false;
        match fetched {
            Ok(items) => {
                let received = items.len();
                let collection = Collection::from_items(items);
                if collection.len() < received {
                    warn!("Backend returned {} duplicate watchlist entries", received - collection.len());
                }
                if let Err(e) = self.store.save(keys::WATCHLIST, &collection) {
                    inner.state.error = Some(e.to_string());
                    return Err(e.into());
                }
                let count = collection.len();
                inner.state.items = collection;
                // Anything confirmed before this fetch is already reflected in it
                inner.confirmed.clear();
                inner.state.error = None;
                info!("Watchlist hydrated from backend ({} items)", count);
                Ok(HydrateOutcome::Replaced { count })
            }
            Err(e) => {
                warn!("Watchlist fetch failed, keeping local copy: {}", e);
                inner.state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Read the legacy favorites endpoint without touching local state.
    pub async fn legacy_favorites(&self) -> Result<Vec<SavedItem>, BackendError> {
        self.api.fetch_legacy_favorites().await
    }

    fn issue(&self, key: &ItemKey) -> (u64, Option<u64>) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let previous = self.lock().latest.insert(key.clone(), sequence);
        (sequence, previous)
    }

    /// A failed toggle hands "latest" back to the one before it. If that
    /// one's reply has already been discarded as stale, it is applied now;
    /// otherwise it applies when it arrives.
    fn release(&self, key: &ItemKey, sequence: u64, previous: Option<u64>) {
        let mut inner = self.lock();
        if inner.latest.get(key) != Some(&sequence) {
            return;
        }
        self.restore_latest(&mut inner, key, sequence, previous);
        self.settle_confirmed(&mut inner, key);
    }

    fn settle_confirmed(&self, inner: &mut Inner, key: &ItemKey) {
        let Some(latest) = inner.latest.get(key).copied() else {
            return;
        };
        let Some(confirmed) = inner
            .confirmed
            .get(key)
            .filter(|confirmed| confirmed.sequence == latest)
            .cloned()
        else {
            return;
        };

        let mut next = inner.state.items.clone();
        next.apply_membership(confirmed.item, confirmed.added);
        if next == inner.state.items {
            return;
        }
        match self.store.save(keys::WATCHLIST, &next) {
            Ok(()) => {
                info!(
                    "Applied confirmed toggle #{} for {} after a newer one failed",
                    confirmed.sequence, key
                );
                inner.state.items = next;
            }
            Err(e) => warn!("Could not persist confirmed toggle for {}: {}", key, e),
        }
    }

    fn restore_latest(&self, inner: &mut Inner, key: &ItemKey, sequence: u64, previous: Option<u64>) {
        if inner.latest.get(key) != Some(&sequence) {
            return;
        }
        match previous {
            Some(previous) => {
                inner.latest.insert(key.clone(), previous);
            }
            None => {
                inner.latest.remove(key);
            }
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("items", &self.lock().state.items.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
