use std::collections::BTreeSet;

use anyhow::Result;

use crate::store::{KEY_COMPLETED, KEY_FAVORITES, KeyValueStore, load_id_set, save_id_set};

/// Per-user completed and favorite markers. The store is the source of truth;
/// these sets mirror it and every mutation writes straight back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    completed: BTreeSet<u32>,
    favorites: BTreeSet<u32>,
}

impl Progress {
    pub(crate) fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            completed: load_id_set(store, KEY_COMPLETED),
            favorites: load_id_set(store, KEY_FAVORITES),
        }
    }

    pub(crate) fn completed(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    pub(crate) fn favorites(&self) -> &BTreeSet<u32> {
        &self.favorites
    }

    pub(crate) fn is_completed(&self, id: u32) -> bool {
        self.completed.contains(&id)
    }

    pub(crate) fn is_favorite(&self, id: u32) -> bool {
        self.favorites.contains(&id)
    }

    /// Returns whether the episode is a favorite after the toggle.
    pub(crate) fn toggle_favorite(&mut self, store: &dyn KeyValueStore, id: u32) -> Result<bool> {
        let mut next = self.favorites.clone();
        let now_favorite = if next.remove(&id) {
            false
        } else {
            next.insert(id);
            true
        };
        save_id_set(store, KEY_FAVORITES, &next)?;
        self.favorites = next;
        Ok(now_favorite)
    }

    /// Returns `true` only when the id was newly added; storage is untouched otherwise.
    /// Both mutations leave the sets as they were when the write fails.
    pub(crate) fn mark_completed(&mut self, store: &dyn KeyValueStore, id: u32) -> Result<bool> {
        if self.completed.contains(&id) {
            return Ok(false);
        }
        let mut next = self.completed.clone();
        next.insert(id);
        save_id_set(store, KEY_COMPLETED, &next)?;
        self.completed = next;
        Ok(true)
    }
}
