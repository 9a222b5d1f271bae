//! Favorite news items and bills, persisted in the key-value store.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::store::{KeyValueStore, StoreError};

/// Which favorites list an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    News,
    Project,
}

impl FavoriteKind {
    const fn key(self) -> &'static str {
        match self {
            Self::News => "plenary:favorite_news",
            Self::Project => "plenary:favorite_projects",
        }
    }
}

impl fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::News => f.write_str("news"),
            Self::Project => f.write_str("project"),
        }
    }
}

impl FromStr for FavoriteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            "project" | "projects" | "bill" | "bills" => Ok(Self::Project),
            other => Err(format!("unknown favorites list: {other}")),
        }
    }
}

/// Favorites lists backed by a [`KeyValueStore`].
#[derive(Clone)]
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Ids in the order they were added.
    pub fn list(&self, kind: FavoriteKind) -> Result<Vec<u64>, StoreError> {
        match self.store.get(kind.key())? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::Corrupt(format!("{kind} favorites: {e}"))),
        }
    }

    pub fn is_favorite(&self, kind: FavoriteKind, id: u64) -> Result<bool, StoreError> {
        Ok(self.list(kind)?.contains(&id))
    }

    /// Add `id` if absent, remove it if present. Returns the new membership.
    pub fn toggle(&self, kind: FavoriteKind, id: u64) -> Result<bool, StoreError> {
        let mut ids = self.list(kind)?;
        let now_favorite = if let Some(pos) = ids.iter().position(|&x| x == id) {
            ids.remove(pos);
            false
        } else {
            ids.push(id);
            true
        };
        if ids.is_empty() {
            self.store.remove(kind.key())?;
        } else {
            let raw = serde_json::to_string(&ids)
                .map_err(|e| StoreError::Corrupt(format!("{kind} favorites: {e}")))?;
            self.store.set(kind.key(), &raw)?;
        }
        debug!(%kind, id, favorite = now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }
}
