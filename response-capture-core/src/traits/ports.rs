use crate::models::error::CaptureError;
use crate::models::stimulus::{ReplayState, SlideConfig, SlideKey};
use crate::models::take::Take;

/// Supplies stimulus metadata and response policy for a slide.
pub trait ContentProvider: Send {
    fn load_slide_config(&self, slide_id: &str) -> Result<SlideConfig, CaptureError>;
}

/// Durable storage for view state and submitted takes.
pub trait ResponseStore: Send {
    fn load_view_state(&self, key: &SlideKey) -> Result<Option<ReplayState>, CaptureError>;

    fn save_view_state(&self, key: &SlideKey, state: ReplayState) -> Result<(), CaptureError>;

    fn submit_response(&self, key: &SlideKey, take: &Take) -> Result<(), CaptureError>;
}

/// Simple keyed storage shared between slides.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);
}

/// The slide-sequencing UI around the engine.
pub trait NavigationHost: Send {
    /// Called exactly once per slide instance, after teardown.
    fn on_response_submitted(&self, key: &SlideKey);

    /// Called after teardown when the user leaves without submitting.
    fn on_slide_left(&self, _key: &SlideKey) {}
}
