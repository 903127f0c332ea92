use std::fmt;

use serde::{Deserialize, Serialize};

use super::policy::ResponsePolicy;

/// The prompt video shown before a response is recorded.
///
/// Immutable once loaded for a slide instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusVideo {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub context_text: Option<String>,
    #[serde(default = "default_allow_replay")]
    pub allow_replay: bool,
    #[serde(default)]
    pub max_replays: u32,
}

fn default_allow_replay() -> bool {
    true
}

/// How many times the stimulus has been watched to completion.
///
/// Persisted per (user, slide) pair across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayState {
    pub view_count: u32,
}

/// Everything the content provider supplies for one slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideConfig {
    pub stimulus: StimulusVideo,
    pub policy: ResponsePolicy,
}

/// Identifies one user's view of one slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideKey {
    pub user_id: String,
    pub slide_id: String,
}

impl SlideKey {
    pub fn new(user_id: impl Into<String>, slide_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            slide_id: slide_id.into(),
        }
    }
}

impl fmt::Display for SlideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.slide_id)
    }
}
