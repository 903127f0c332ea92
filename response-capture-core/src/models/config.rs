use std::time::Duration;

use super::constraints::MediaConstraints;
use super::policy::TakeBudget;

/// Configuration for a response engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Owner of the per-(user, slide) replay state.
    pub user_id: String,

    /// Number of countdown ticks before recording starts (default: 3).
    pub countdown_ticks: u32,

    /// Cadence of countdown/duration ticks and recorder chunk slicing.
    pub tick_interval: Duration,

    /// First capture request made on every acquisition.
    pub preferred_constraints: MediaConstraints,

    /// Retried once when the preferred request cannot be satisfied.
    pub fallback_constraints: MediaConstraints,

    /// Whether `max_takes` is a lifetime or a live-capacity limit.
    pub take_budget: TakeBudget,

    /// Container label attached to finalized takes.
    pub mime_type: String,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user id must not be empty".into());
        }
        if !(1..=10).contains(&self.countdown_ticks) {
            return Err(format!("unsupported countdown length: {}", self.countdown_ticks));
        }
        if self.tick_interval.is_zero() {
            return Err("tick interval must be positive".into());
        }
        if !self.fallback_constraints.audio {
            return Err("fallback constraints must request audio".into());
        }
        Ok(())
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_id: "anonymous".into(),
            countdown_ticks: 3,
            tick_interval: Duration::from_secs(1),
            preferred_constraints: MediaConstraints::preferred(),
            fallback_constraints: MediaConstraints::minimal(),
            take_budget: TakeBudget::Lifetime,
            mime_type: "video/webm".into(),
        }
    }
}
