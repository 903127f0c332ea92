use crate::models::error::CaptureError;
use crate::models::phase::Phase;
use crate::models::take::{TakeId, TakeSummary};

/// Event delegate for engine notifications.
///
/// Every method has an empty default so hosts implement only what they render.
pub trait EngineDelegate: Send + Sync {
    fn on_phase_changed(&self, _from: Phase, _to: Phase) {}

    /// Remaining countdown ticks, called after every tick.
    fn on_countdown_tick(&self, _remaining: u32) {}

    /// Active recording seconds, called after every tick.
    fn on_recording_progress(&self, _elapsed_secs: f64, _max_secs: f64) {}

    fn on_view_count_changed(&self, _view_count: u32) {}

    fn on_take_added(&self, _take: &TakeSummary) {}

    /// A take was pushed out by a newer one.
    fn on_take_evicted(&self, _id: TakeId) {}

    /// A take was discarded by the user.
    fn on_take_removed(&self, _id: TakeId) {}

    fn on_error(&self, _error: &CaptureError) {}
}
