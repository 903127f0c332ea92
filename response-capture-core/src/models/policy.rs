use serde::{Deserialize, Serialize};

/// Rules for the recorded response of one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePolicy {
    pub allow_multiple_takes: bool,
    pub max_takes: u32,
    pub max_duration_seconds: u32,
    pub instant_response_required: bool,
}

impl ResponsePolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_takes == 0 {
            return Err("max takes must be at least 1".into());
        }
        if self.max_duration_seconds == 0 {
            return Err("max duration must be positive".into());
        }
        Ok(())
    }

    /// Capacity of the take repository.
    ///
    /// Single-take slides always get exactly one slot so the first take is
    /// never refused.
    pub fn effective_max_takes(&self) -> usize {
        if self.allow_multiple_takes {
            self.max_takes.max(1) as usize
        } else {
            1
        }
    }
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            allow_multiple_takes: false,
            max_takes: 1,
            max_duration_seconds: 60,
            instant_response_required: false,
        }
    }
}

/// How `max_takes` limits recording over a slide instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TakeBudget {
    /// `max_takes` caps every take finalized during the slide instance.
    #[default]
    Lifetime,
    /// `max_takes` caps takes currently held; re-recording at capacity
    /// evicts the oldest.
    Live,
}
