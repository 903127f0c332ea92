//! Shared "stimulus watched" flag, readable by other slides.

use crate::models::stimulus::SlideKey;
use crate::traits::ports::KeyValueStore;

pub fn watched_key(key: &SlideKey) -> String {
    format!("watched/{}/{}", key.user_id, key.slide_id)
}

pub fn mark_watched(store: &dyn KeyValueStore, key: &SlideKey) {
    store.set(&watched_key(key), "true".into());
}

pub fn was_watched(store: &dyn KeyValueStore, user_id: &str, slide_id: &str) -> bool {
    let key = SlideKey::new(user_id, slide_id);
    store.get(&watched_key(&key)).as_deref() == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_kv::MemoryKeyValueStore;

    #[test]
    fn flag_round_trips_through_store() {
        let store = MemoryKeyValueStore::new();
        let key = SlideKey::new("u1", "slide-3");

        assert!(!was_watched(&store, "u1", "slide-3"));
        mark_watched(&store, &key);
        assert!(was_watched(&store, "u1", "slide-3"));
        assert!(!was_watched(&store, "u2", "slide-3"));
    }
}
