use crate::item::{ItemKey, SavedItem};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Ordered set of saved items, unique by [`ItemKey`].
///
/// Insertion order is display order; adds go to the front.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection {
    items: Vec<SavedItem>,
}

impl Collection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a collection keeping the first occurrence of each key.
    pub fn from_items(items: impl IntoIterator<Item = SavedItem>) -> Self {
        let mut collection = Self::new();
        for item in items {
            if !collection.contains(&item.key()) {
                collection.items.push(item);
            }
        }
        collection
    }

    /// Build a collection where later entries overwrite earlier entries with
    /// the same key. Each key keeps the position where it was first seen.
    pub fn merge_last_seen_wins(items: impl IntoIterator<Item = SavedItem>) -> Self {
        let mut positions: HashMap<ItemKey, usize> = HashMap::new();
        let mut merged: Vec<SavedItem> = Vec::new();
        for item in items {
            let key = item.key();
            match positions.get(&key) {
                Some(&index) => merged[index] = item,
                None => {
                    positions.insert(key, merged.len());
                    merged.push(item);
                }
            }
        }
        Self { items: merged }
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|item| &item.key() == key)
    }

    pub fn get(&self, key: &ItemKey) -> Option<&SavedItem> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Insert at the front. Returns false (and changes nothing) when the key
    /// is already present.
    pub fn insert_front(&mut self, item: SavedItem) -> bool {
        if self.contains(&item.key()) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Remove every entry with `key`, returning how many were dropped.
    pub fn remove(&mut self, key: &ItemKey) -> usize {
        let before = self.items.len();
        self.items.retain(|item| &item.key() != key);
        before - self.items.len()
    }

    /// Make the collection reflect `added` for this item.
    pub fn apply_membership(&mut self, item: SavedItem, added: bool) {
        if added {
            self.insert_front(item);
        } else {
            self.remove(&item.key());
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<SavedItem> {
        self.items
    }
}

// Deserializing goes through `from_items` so a stored list with duplicates
// can never produce a collection that breaks the uniqueness invariant.
// Entries that are not items at all are skipped one by one; only a payload
// that is not a list fails as a whole.
impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Value>::deserialize(deserializer)?;
        let total = values.len();
        let items: Vec<SavedItem> = values
            .into_iter()
            .filter_map(|value| match SavedItem::deserialize(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping unreadable saved item: {}", e);
                    None
                }
            })
            .collect();
        if items.len() < total {
            warn!("Dropped {} of {} saved items while loading", total - items.len(), total);
        }
        Ok(Self::from_items(items))
    }
}

impl FromIterator<SavedItem> for Collection {
    fn from_iter<I: IntoIterator<Item = SavedItem>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl IntoIterator for Collection {
    type Item = SavedItem;
    type IntoIter = std::vec::IntoIter<SavedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
