use std::fmt;

use super::error::CaptureError;
use super::take::TakeSummary;
use crate::probe::capability::Capability;

/// Engine phase for a slide instance.
///
/// ```text
/// Stimulus → Countdown → Recording → Review → Submitted
///    ↑  ↺        ↑                     │
///    │           └──── re-record ──────┤
///    └──────── watch again ────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stimulus,
    Countdown,
    Recording,
    Review,
    Submitted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Phases that hold (or are acquiring) capture hardware.
    pub fn uses_device(&self) -> bool {
        matches!(self, Self::Countdown | Self::Recording)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stimulus => "stimulus",
            Self::Countdown => "countdown",
            Self::Recording => "recording",
            Self::Review => "review",
            Self::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// Why a recording pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    TimeLimit,
}

/// The action a surfaced error lets the user retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Re-enter the countdown and acquire the device again.
    Capture,
    /// Ask the content provider for the slide again.
    StimulusLoad,
    /// Submit the selected take again.
    Submit,
}

/// A user-visible, non-fatal error.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOverlay {
    pub error: CaptureError,
    pub retry: Option<RetryKind>,
}

impl ErrorOverlay {
    pub fn new(error: CaptureError) -> Self {
        let retry = error.retry_kind();
        Self { error, retry }
    }
}

/// What the UI may offer the user right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_play_stimulus: bool,
    pub can_record: bool,
    pub can_rerecord: bool,
    pub can_discard: bool,
    pub can_watch_again: bool,
    pub can_submit: bool,
    pub can_pause_recording: bool,
    pub can_resume_recording: bool,
    pub can_stop_recording: bool,
}

/// Point-in-time view of the engine for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub stimulus_loaded: bool,
    pub awaiting_permission: bool,
    pub countdown_remaining: Option<u32>,
    pub recording_elapsed_secs: Option<f64>,
    pub recording_paused: bool,
    pub view_count: u32,
    pub takes: Vec<TakeSummary>,
    pub takes_recorded: u32,
    pub error: Option<ErrorOverlay>,
    pub capability: Capability,
    pub affordances: Affordances,
}
