use std::fmt;

use chrono::{DateTime, Utc};

/// Unique, monotonically increasing take identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TakeId(pub u64);

impl fmt::Display for TakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "take-{}", self.0)
    }
}

/// A revocable, playable reference to a take's media (an object URL in a
/// browser host). Only meaningful while the handle registry says it is live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayableHandle(String);

impl PlayableHandle {
    pub(crate) fn new(url: String) -> Self {
        Self(url)
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Media produced by one recording pass, before it becomes a take.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedMedia {
    pub bytes: Vec<u8>,
    pub duration_secs: f64,
    pub chunk_count: usize,
}

/// A single finalized recorded response.
///
/// Owned exclusively by the take repository from creation until disposal.
#[derive(Debug, PartialEq)]
pub struct Take {
    pub id: TakeId,
    pub media_bytes: Vec<u8>,
    pub playable_handle: PlayableHandle,
    pub recorded_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub mime_type: String,
}

impl Take {
    pub fn summary(&self, selected: bool) -> TakeSummary {
        TakeSummary {
            id: self.id,
            url: self.playable_handle.url().to_string(),
            duration_secs: self.duration_secs,
            size_bytes: self.media_bytes.len(),
            recorded_at: self.recorded_at,
            selected,
        }
    }
}

/// Render-friendly view of a take; holds no media bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TakeSummary {
    pub id: TakeId,
    pub url: String,
    pub duration_secs: f64,
    pub size_bytes: usize,
    pub recorded_at: DateTime<Utc>,
    pub selected: bool,
}
