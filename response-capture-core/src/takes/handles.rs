use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::take::{PlayableHandle, TakeId};

/// Issues and revokes playable handles for take media.
///
/// Clones share the same live set, so a host can observe which handles are
/// still valid.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    live: Arc<Mutex<HashSet<PlayableHandle>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, take: TakeId) -> PlayableHandle {
        let handle = PlayableHandle::new(format!(
            "blob:response-capture/{}/{}",
            take,
            uuid::Uuid::new_v4()
        ));
        self.live.lock().insert(handle.clone());
        handle
    }

    /// Returns false if the handle was not live.
    pub fn revoke(&self, handle: &PlayableHandle) -> bool {
        let removed = self.live.lock().remove(handle);
        if !removed {
            log::debug!("Handle {} already revoked", handle.url());
        }
        removed
    }

    pub fn is_live(&self, handle: &PlayableHandle) -> bool {
        self.live.lock().contains(handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    pub fn live_handles(&self) -> HashSet<PlayableHandle> {
        self.live.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_revoke() {
        let registry = HandleRegistry::new();
        let a = registry.create(TakeId(1));
        let b = registry.create(TakeId(2));

        assert_ne!(a, b);
        assert!(a.url().starts_with("blob:response-capture/take-1/"));
        assert_eq!(registry.live_count(), 2);

        assert!(registry.revoke(&a));
        assert!(!registry.revoke(&a));
        assert!(!registry.is_live(&a));
        assert!(registry.is_live(&b));
    }

    #[test]
    fn clones_share_live_set() {
        let registry = HandleRegistry::new();
        let observer = registry.clone();
        let h = registry.create(TakeId(7));

        assert!(observer.is_live(&h));
        observer.revoke(&h);
        assert_eq!(registry.live_count(), 0);
    }
}
