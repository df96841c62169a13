use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use tracing::warn;

pub(crate) const KEY_THEME: &str = "theme";
pub(crate) const KEY_COMPLETED: &str = "completedEpisodes";
pub(crate) const KEY_FAVORITES: &str = "favorites";
pub(crate) const KEY_APP_MODE: &str = "app_mode";
pub(crate) const KEY_ADMIN_PASSWORD: &str = "adminPassword";
pub(crate) const KEY_SUPPORT_LINK: &str = "supportLink";
pub(crate) const KEY_SUPPORT_IMAGE: &str = "supportImage";
pub(crate) const KEY_COUNTED_VISIT: &str = "has_counted_visit";

/// String key/value persistence port.
///
/// Everything the app remembers between runs goes through this trait so the
/// controllers never see the storage backend.
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store used for session-scoped flags and in tests.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads a JSON array of ids; unreadable or malformed values become an empty set.
pub(crate) fn load_id_set(store: &dyn KeyValueStore, key: &str) -> BTreeSet<u32> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeSet::new(),
        Err(err) => {
            warn!(key, error = %err, "failed to read stored id set");
            return BTreeSet::new();
        }
    };
    match serde_json::from_str::<Vec<u32>>(&raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(err) => {
            warn!(key, error = %err, "ignoring malformed stored id set");
            BTreeSet::new()
        }
    }
}

pub(crate) fn save_id_set(store: &dyn KeyValueStore, key: &str, ids: &BTreeSet<u32>) -> Result<()> {
    let ids: Vec<u32> = ids.iter().copied().collect();
    store.set(key, &serde_json::to_string(&ids)?)
}

/// Reads an optional string value, logging and hiding storage failures.
pub(crate) fn get_or_log(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "failed to read stored value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_overwrites_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").expect("get"), None);
        store.set("k", "1").expect("set");
        store.set("k", "2").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("2"));
    }

    #[test]
    fn id_set_round_trips_as_json_array() {
        let store = MemoryStore::new();
        let ids: BTreeSet<u32> = [3, 1, 2].into_iter().collect();
        save_id_set(&store, KEY_FAVORITES, &ids).expect("save");
        assert_eq!(
            store.get(KEY_FAVORITES).expect("get").as_deref(),
            Some("[1,2,3]")
        );
        assert_eq!(load_id_set(&store, KEY_FAVORITES), ids);
    }

    #[test]
    fn malformed_id_set_falls_back_to_empty() {
        let store = MemoryStore::new();
        store.set(KEY_COMPLETED, "{not json").expect("set");
        assert!(load_id_set(&store, KEY_COMPLETED).is_empty());
        store.set(KEY_COMPLETED, "[\"a\"]").expect("set");
        assert!(load_id_set(&store, KEY_COMPLETED).is_empty());
    }
}
