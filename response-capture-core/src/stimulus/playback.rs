use crate::models::error::CaptureError;
use crate::models::stimulus::{ReplayState, StimulusVideo};
use crate::stimulus::replay::ReplayPolicy;

/// Forward jumps larger than this count as scrubbing, not playback.
const SEEK_TOLERANCE_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Ended,
}

/// How a playback pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Reached the end naturally; carries the incremented replay state.
    Completed(ReplayState),
    /// Reached the end after skipping ahead; no view was counted.
    Scrubbed,
}

/// Plays the prompt video and counts natural completions.
pub struct StimulusPlayback {
    stimulus: StimulusVideo,
    policy: ReplayPolicy,
    replay: ReplayState,
    state: PlaybackState,
    watched_to: f64,
    scrubbed: bool,
}

impl StimulusPlayback {
    pub fn new(stimulus: StimulusVideo, replay: ReplayState) -> Self {
        let policy = ReplayPolicy::from(&stimulus);
        Self {
            replay: policy.clamp(replay),
            stimulus,
            policy,
            state: PlaybackState::Idle,
            watched_to: 0.0,
            scrubbed: false,
        }
    }

    pub fn stimulus(&self) -> &StimulusVideo {
        &self.stimulus
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn replay_state(&self) -> ReplayState {
        self.replay
    }

    pub fn view_count(&self) -> u32 {
        self.replay.view_count
    }

    /// Whether a new playback pass may start.
    pub fn can_play(&self) -> bool {
        self.policy.can_play(&self.replay)
    }

    /// Start a pass, or continue a paused one.
    pub fn play(&mut self) -> Result<(), CaptureError> {
        match self.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::Ended => {
                if !self.can_play() {
                    return Err(CaptureError::ReplayNotAllowed);
                }
                log::debug!("Stimulus pass {} started", self.replay.view_count + 1);
                self.state = PlaybackState::Playing;
                self.watched_to = 0.0;
                self.scrubbed = false;
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Periodic position report while playing.
    pub fn time_update(&mut self, position_secs: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.watched_to = self.watched_to.max(position_secs);
    }

    /// Explicit seek by the user.
    pub fn seek(&mut self, position_secs: f64) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Ended) {
            return;
        }
        if position_secs > self.watched_to + SEEK_TOLERANCE_SECS {
            log::debug!("Stimulus scrubbed ahead to {:.1}s", position_secs);
            self.scrubbed = true;
        }
    }

    /// The video reported its end. Returns `None` when no pass was running.
    pub fn ended(&mut self) -> Option<PlaybackEnd> {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return None;
        }
        self.state = PlaybackState::Ended;

        if self.scrubbed {
            log::info!("Stimulus ended after scrubbing; view not counted");
            return Some(PlaybackEnd::Scrubbed);
        }

        self.replay = self.policy.on_playback_completed(self.replay);
        log::info!("Stimulus completed, view count {}", self.replay.view_count);
        Some(PlaybackEnd::Completed(self.replay))
    }
}
