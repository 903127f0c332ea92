use std::collections::VecDeque;

use chrono::Utc;

use crate::models::error::CaptureError;
use crate::models::take::{Take, TakeId, TakeSummary};
use crate::takes::handles::HandleRegistry;

/// Result of admitting a take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub id: TakeId,
    /// The oldest take, pushed out to make room.
    pub evicted: Option<TakeId>,
}

/// Bounded collection of finalized takes for one slide instance.
///
/// Invariants:
/// - `0 <= len <= capacity`
/// - every held take has exactly one live handle, and no other handle issued
///   by this repository is live
/// - the selection, when set, names a held take; a non-empty repository
///   always has a selection
pub struct TakeRepository {
    takes: VecDeque<Take>,
    capacity: usize,
    selected: Option<TakeId>,
    next_id: u64,
    handles: HandleRegistry,
    mime_type: String,
}

impl TakeRepository {
    pub fn new(capacity: usize, handles: HandleRegistry, mime_type: impl Into<String>) -> Self {
        Self {
            takes: VecDeque::new(),
            capacity: capacity.max(1),
            selected: None,
            next_id: 1,
            handles,
            mime_type: mime_type.into(),
        }
    }

    /// Admit a take, evicting the oldest one when full. The new take becomes
    /// the selection.
    pub fn add(&mut self, media_bytes: Vec<u8>, duration_secs: f64) -> Result<AddOutcome, CaptureError> {
        if media_bytes.is_empty() {
            return Err(CaptureError::NoDataCaptured);
        }

        let evicted = if self.takes.len() >= self.capacity {
            self.takes.pop_front().map(|old| {
                self.handles.revoke(&old.playable_handle);
                log::info!("Evicted {} to admit a new take", old.id);
                old.id
            })
        } else {
            None
        };

        let id = TakeId(self.next_id);
        self.next_id += 1;
        let take = Take {
            id,
            playable_handle: self.handles.create(id),
            media_bytes,
            recorded_at: Utc::now(),
            duration_secs,
            mime_type: self.mime_type.clone(),
        };
        log::info!("Added {} ({} bytes, {:.1}s)", id, take.media_bytes.len(), duration_secs);

        self.takes.push_back(take);
        self.selected = Some(id);
        Ok(AddOutcome { id, evicted })
    }

    pub fn select(&mut self, id: TakeId) -> Result<(), CaptureError> {
        if self.get(id).is_none() {
            return Err(CaptureError::UnknownTake(id.0));
        }
        self.selected = Some(id);
        Ok(())
    }

    /// Discard one take and release its handle.
    pub fn remove(&mut self, id: TakeId) -> Result<(), CaptureError> {
        let index = self
            .takes
            .iter()
            .position(|t| t.id == id)
            .ok_or(CaptureError::UnknownTake(id.0))?;

        if let Some(take) = self.takes.remove(index) {
            self.handles.revoke(&take.playable_handle);
        }
        if self.selected == Some(id) {
            self.selected = self.takes.back().map(|t| t.id);
        }
        Ok(())
    }

    /// Release every handle and drop every take. Returns how many were held.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.takes.len();
        for take in self.takes.drain(..) {
            self.handles.revoke(&take.playable_handle);
        }
        self.selected = None;
        if count > 0 {
            log::info!("Disposed {} takes", count);
        }
        count
    }

    pub fn get(&self, id: TakeId) -> Option<&Take> {
        self.takes.iter().find(|t| t.id == id)
    }

    pub fn selected(&self) -> Option<&Take> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<TakeId> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.takes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.takes.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ids(&self) -> Vec<TakeId> {
        self.takes.iter().map(|t| t.id).collect()
    }

    pub fn summaries(&self) -> Vec<TakeSummary> {
        self.takes
            .iter()
            .map(|t| t.summary(self.selected == Some(t.id)))
            .collect()
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }
}

impl Drop for TakeRepository {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn repo(capacity: usize) -> TakeRepository {
        TakeRepository::new(capacity, HandleRegistry::new(), "video/webm")
    }

    fn live_handles_match(repo: &TakeRepository) -> bool {
        let held: HashSet<_> = repo.takes.iter().map(|t| t.playable_handle.clone()).collect();
        held == repo.handles().live_handles()
    }

    #[test]
    fn third_take_evicts_oldest() {
        let mut r = repo(2);
        let a = r.add(vec![1], 1.0).unwrap();
        let a_handle = r.get(a.id).unwrap().playable_handle.clone();
        let b = r.add(vec![2], 1.0).unwrap();
        let c = r.add(vec![3], 1.0).unwrap();

        assert_eq!(c.evicted, Some(a.id));
        assert_eq!(r.ids(), vec![b.id, c.id]);
        assert!(!r.handles().is_live(&a_handle));
        assert!(live_handles_match(&r));
    }

    #[test]
    fn ids_are_monotonic_and_newest_is_selected() {
        let mut r = repo(3);
        let a = r.add(vec![1], 1.0).unwrap();
        let b = r.add(vec![2], 2.0).unwrap();

        assert!(b.id > a.id);
        assert_eq!(r.selected_id(), Some(b.id));
        r.select(a.id).unwrap();
        assert_eq!(r.selected().unwrap().media_bytes, vec![1]);
    }

    #[test]
    fn empty_media_is_refused() {
        let mut r = repo(1);
        assert_eq!(r.add(Vec::new(), 3.0).unwrap_err(), CaptureError::NoDataCaptured);
        assert!(r.is_empty());
    }

    #[test]
    fn remove_moves_selection_to_newest_remaining() {
        let mut r = repo(3);
        let a = r.add(vec![1], 1.0).unwrap();
        let b = r.add(vec![2], 1.0).unwrap();
        let c = r.add(vec![3], 1.0).unwrap();

        r.select(b.id).unwrap();
        r.remove(b.id).unwrap();
        assert_eq!(r.selected_id(), Some(c.id));

        r.remove(c.id).unwrap();
        assert_eq!(r.selected_id(), Some(a.id));

        r.remove(a.id).unwrap();
        assert_eq!(r.selected_id(), None);
        assert_eq!(r.handles().live_count(), 0);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut r = repo(2);
        r.add(vec![1], 1.0).unwrap();
        assert_eq!(r.select(TakeId(99)).unwrap_err(), CaptureError::UnknownTake(99));
        assert_eq!(r.remove(TakeId(99)).unwrap_err(), CaptureError::UnknownTake(99));
    }

    #[test]
    fn dispose_all_is_idempotent() {
        let mut r = repo(2);
        r.add(vec![1], 1.0).unwrap();
        r.add(vec![2], 1.0).unwrap();

        assert_eq!(r.dispose_all(), 2);
        assert_eq!(r.dispose_all(), 0);
        assert_eq!(r.handles().live_count(), 0);
        assert!(r.selected().is_none());
    }

    #[test]
    fn drop_releases_handles() {
        let registry = HandleRegistry::new();
        {
            let mut r = TakeRepository::new(2, registry.clone(), "video/webm");
            r.add(vec![1], 1.0).unwrap();
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn mixed_add_remove_keeps_invariants() {
        let mut r = repo(3);
        // Deterministic pseudo-random walk over add/remove.
        let mut seed: u32 = 17;
        for step in 0..200u32 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if seed % 3 == 0 && !r.is_empty() {
                let ids = r.ids();
                let victim = ids[(seed as usize / 7) % ids.len()];
                r.remove(victim).unwrap();
            } else {
                r.add(vec![step as u8 + 1], 1.0).unwrap();
            }
            assert!(r.len() <= r.capacity());
            assert!(live_handles_match(&r));
            if !r.is_empty() {
                assert!(r.selected().is_some());
            }
        }
    }
}
