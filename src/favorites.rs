// src/favorites.rs
//! Favorites set and the two views the digest page shows.
//!
//! This is the reference model of the page's client program: same storage
//! layout (one key holding a JSON array of items in addition order), same
//! toggle semantics, same view ordering.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::assemble::DigestItem;

/// Durable snapshot of an item, serialized exactly like a `DigestItem`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FavoriteRecord(pub DigestItem);

impl FavoriteRecord {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

/// Client-local key/value storage (the browser's `localStorage`).
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.inner
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// Not a favorite and not in today's list: nothing to snapshot.
    Ignored,
}

pub struct FavoritesStore<'s, S: KeyValueStorage> {
    storage: &'s S,
    key: String,
    records: Vec<FavoriteRecord>, // addition order, oldest first
}

impl<'s, S: KeyValueStorage> FavoritesStore<'s, S> {
    /// Load from storage. Unreadable or foreign data counts as an empty set.
    pub fn load(storage: &'s S, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = storage
            .get(&key)
            .and_then(|raw| serde_json::from_str::<Vec<serde_json::Value>>(&raw).ok())
            .map(|vals| {
                vals.into_iter()
                    .filter_map(|v| serde_json::from_value::<FavoriteRecord>(v).ok())
                    .filter(|r| !r.id().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            storage,
            key,
            records,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove by id if present, otherwise store a full snapshot of the item
    /// from `today`. Each change rewrites the whole stored list.
    pub fn toggle(&mut self, id: &str, today: &[DigestItem]) -> Toggle {
        let outcome = if self.contains(id) {
            self.records.retain(|r| r.id() != id);
            Toggle::Removed
        } else if let Some(item) = today.iter().find(|it| it.id == id) {
            self.records.push(FavoriteRecord(item.clone()));
            Toggle::Added
        } else {
            return Toggle::Ignored;
        };
        self.persist();
        outcome
    }

    fn persist(&self) {
        match serde_json::to_string(&self.records) {
            Ok(s) => self.storage.set(&self.key, s),
            Err(e) => tracing::warn!(error = %e, "favorites not persisted"),
        }
    }

    /// Newest addition first. Read-only; stored order is untouched.
    pub fn ordered_view(&self) -> Vec<&FavoriteRecord> {
        self.records.iter().rev().collect()
    }

    pub fn get(&self, id: &str) -> Option<&FavoriteRecord> {
        self.records.iter().find(|r| r.id() == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Favorites,
}

impl View {
    /// Page title and header text; the client program uses the same strings.
    pub fn heading(self) -> &'static str {
        match self {
            View::Feed => "Comfy 热点",
            View::Favorites => "Comfy 收藏",
        }
    }

    pub fn count_unit(self) -> &'static str {
        match self {
            View::Feed => "条精选",
            View::Favorites => "条收藏",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card<'a> {
    pub item: &'a DigestItem,
    pub favorited: bool,
}

/// What the page shows for the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel<'a> {
    pub view: View,
    pub heading: &'static str,
    pub count_label: String,
    pub cards: Vec<Card<'a>>,
}

/// Merge today's items with the favorites set for `view`.
///
/// Feed cards always show today's content (a favorited id gets its star);
/// favorites cards always show the stored snapshot.
pub fn reconcile<'a, S: KeyValueStorage>(
    view: View,
    today: &'a [DigestItem],
    favorites: &'a FavoritesStore<'_, S>,
) -> ViewModel<'a> {
    let cards: Vec<Card<'a>> = match view {
        View::Feed => today
            .iter()
            .map(|item| Card {
                item,
                favorited: favorites.contains(&item.id),
            })
            .collect(),
        View::Favorites => favorites
            .ordered_view()
            .into_iter()
            .map(|r| Card {
                item: &r.0,
                favorited: true,
            })
            .collect(),
    };
    ViewModel {
        view,
        heading: view.heading(),
        count_label: format!("{} {}", cards.len(), view.count_unit()),
        cards,
    }
}
