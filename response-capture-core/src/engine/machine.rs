use std::sync::Arc;

use crate::device::session::AcquireProgress;
use crate::engine::lifecycle::{ResourceScope, TeardownReport};
use crate::models::config::EngineConfig;
use crate::models::error::CaptureError;
use crate::models::phase::{Affordances, EngineSnapshot, ErrorOverlay, Phase, RetryKind, StopReason};
use crate::models::policy::{ResponsePolicy, TakeBudget};
use crate::models::stimulus::{ReplayState, SlideConfig, SlideKey};
use crate::models::take::TakeId;
use crate::probe::capability::{check_capability, Capability};
use crate::recorder::controller::ChunkObserver;
use crate::stimulus::playback::{PlaybackEnd, PlaybackState, StimulusPlayback};
use crate::stimulus::watched::mark_watched;
use crate::takes::handles::HandleRegistry;
use crate::takes::repository::TakeRepository;
use crate::traits::capture_backend::{AcquireTicket, CaptureBackend, MediaStream};
use crate::traits::engine_delegate::EngineDelegate;
use crate::traits::ports::{ContentProvider, KeyValueStore, NavigationHost, ResponseStore};

/// External collaborators of a slide instance.
pub struct EnginePorts {
    pub content: Box<dyn ContentProvider>,
    pub backend: Box<dyn CaptureBackend>,
    pub store: Box<dyn ResponseStore>,
    pub shared_state: Arc<dyn KeyValueStore>,
    pub navigation: Box<dyn NavigationHost>,
    pub delegate: Option<Arc<dyn EngineDelegate>>,
}

/// Everything that can happen to a slide instance.
///
/// User input, media element events, device callbacks and timer ticks all
/// enter through `ResponseEngine::dispatch`.
pub enum Action {
    /// Load stimulus and policy from the content provider.
    OpenSlide,
    PlayStimulus,
    PauseStimulus,
    StimulusProgress { position_secs: f64 },
    SeekStimulus { position_secs: f64 },
    StimulusEnded,
    /// Explicit "record" from the stimulus phase.
    Record,
    AcquisitionResolved {
        ticket: AcquireTicket,
        result: Result<Box<dyn MediaStream>, CaptureError>,
    },
    /// One tick of the countdown / recording clock.
    Tick,
    /// The device or encoder failed while a capture pass was running.
    CaptureFailed(CaptureError),
    PauseRecording,
    ResumeRecording,
    StopRecording,
    SelectTake(TakeId),
    DiscardTake(TakeId),
    ReRecord,
    WatchAgain,
    Submit,
    /// Retry whatever the current error overlay offers.
    Retry,
    DismissError,
    NavigateAway,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenSlide => "open slide",
            Self::PlayStimulus => "play stimulus",
            Self::PauseStimulus => "pause stimulus",
            Self::StimulusProgress { .. } => "stimulus progress",
            Self::SeekStimulus { .. } => "seek stimulus",
            Self::StimulusEnded => "stimulus ended",
            Self::Record => "record",
            Self::AcquisitionResolved { .. } => "acquisition resolved",
            Self::Tick => "tick",
            Self::CaptureFailed(_) => "capture failed",
            Self::PauseRecording => "pause recording",
            Self::ResumeRecording => "resume recording",
            Self::StopRecording => "stop recording",
            Self::SelectTake(_) => "select take",
            Self::DiscardTake(_) => "discard take",
            Self::ReRecord => "re-record",
            Self::WatchAgain => "watch again",
            Self::Submit => "submit",
            Self::Retry => "retry",
            Self::DismissError => "dismiss error",
            Self::NavigateAway => "navigate away",
        }
    }
}

fn invalid(phase: Phase, action: &str) -> CaptureError {
    CaptureError::InvalidTransition {
        phase: phase.to_string(),
        action: action.to_string(),
    }
}

/// Phase state machine for one stimulus + video-response slide instance.
///
/// ```text
/// Stimulus ──(ended, instant, capacity)──→ Countdown ──(ticks)──→ Recording
///    │  ↺ ended without instant response      ↑                     │ stop / time limit
///    └──────────────(record)──────────────────┤                     ↓
///                                             └──(re-record)──── Review ──(submit)──→ Submitted
/// ```
///
/// The engine is the only component that asks for the capture device, and
/// `ResourceScope` is the only one that releases it.
pub struct ResponseEngine {
    config: EngineConfig,
    key: SlideKey,
    ports: EnginePorts,
    phase: Phase,
    slide: Option<SlideConfig>,
    playback: Option<StimulusPlayback>,
    handles: HandleRegistry,
    takes: TakeRepository,
    scope: ResourceScope,
    takes_recorded: u32,
    error: Option<ErrorOverlay>,
}

impl ResponseEngine {
    pub fn new(config: EngineConfig, slide_id: impl Into<String>, ports: EnginePorts) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let key = SlideKey::new(config.user_id.clone(), slide_id);
        let handles = HandleRegistry::new();
        let takes = TakeRepository::new(1, handles.clone(), config.mime_type.clone());
        let scope = ResourceScope::new(
            config.preferred_constraints.clone(),
            config.fallback_constraints.clone(),
        );

        Ok(Self {
            config,
            key,
            ports,
            phase: Phase::Stimulus,
            slide: None,
            playback: None,
            handles,
            takes,
            scope,
            takes_recorded: 0,
            error: None,
        })
    }

    /// Load the slide. Equivalent to dispatching `Action::OpenSlide`.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        self.dispatch(Action::OpenSlide)
    }

    /// Single entry point for every event.
    pub fn dispatch(&mut self, action: Action) -> Result<(), CaptureError> {
        let name = action.name();

        if self.scope.is_torn_down() {
            return match action {
                Action::NavigateAway | Action::Tick | Action::DismissError | Action::CaptureFailed(_) => Ok(()),
                Action::AcquisitionResolved { ticket, result } => self
                    .scope
                    .resolve(&mut *self.ports.backend, ticket, result)
                    .map(|_| ()),
                _ => Err(CaptureError::TornDown),
            };
        }

        let result = match action {
            Action::OpenSlide => self.open_slide(),
            Action::PlayStimulus => self.play_stimulus(),
            Action::PauseStimulus => self.with_playback("pause stimulus", |p| {
                p.pause();
                Ok(())
            }),
            Action::StimulusProgress { position_secs } => self.with_playback("stimulus progress", |p| {
                p.time_update(position_secs);
                Ok(())
            }),
            Action::SeekStimulus { position_secs } => self.with_playback("seek stimulus", |p| {
                p.seek(position_secs);
                Ok(())
            }),
            Action::StimulusEnded => self.stimulus_ended(),
            Action::Record => self.record(),
            Action::AcquisitionResolved { ticket, result } => self.acquisition_resolved(ticket, result),
            Action::Tick => self.tick(),
            Action::CaptureFailed(error) => self.device_lost(error),
            Action::PauseRecording => {
                self.require_phase(&[Phase::Recording], name)?;
                self.scope.pause_recorder()
            }
            Action::ResumeRecording => {
                self.require_phase(&[Phase::Recording], name)?;
                self.scope.resume_recorder()
            }
            Action::StopRecording => {
                self.require_phase(&[Phase::Recording], name)?;
                self.stop_recording(StopReason::Manual)
            }
            Action::SelectTake(id) => {
                self.require_phase(&[Phase::Review, Phase::Stimulus], name)?;
                self.takes.select(id)
            }
            Action::DiscardTake(id) => self.discard_take(id),
            Action::ReRecord => self.rerecord(),
            Action::WatchAgain => self.watch_again(),
            Action::Submit => self.submit(),
            Action::Retry => self.retry(),
            Action::DismissError => {
                self.error = None;
                Ok(())
            }
            Action::NavigateAway => self.navigate_away(),
        };

        if let Err(ref e) = result {
            log::debug!("[{}] `{}` in {} failed: {}", self.key, name, self.phase, e);
        }
        result
    }

    // --- Queries ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn key(&self) -> &SlideKey {
        &self.key
    }

    pub fn slide(&self) -> Option<&SlideConfig> {
        self.slide.as_ref()
    }

    pub fn takes(&self) -> &TakeRepository {
        &self.takes
    }

    /// Shared view of the playable handles issued for this slide's takes.
    pub fn handles(&self) -> HandleRegistry {
        self.handles.clone()
    }

    pub fn error(&self) -> Option<&ErrorOverlay> {
        self.error.as_ref()
    }

    pub fn view_count(&self) -> u32 {
        self.playback.as_ref().map(|p| p.view_count()).unwrap_or(0)
    }

    pub fn takes_recorded(&self) -> u32 {
        self.takes_recorded
    }

    pub fn capability(&self) -> Capability {
        check_capability(&self.ports.backend.environment())
    }

    pub fn is_torn_down(&self) -> bool {
        self.scope.is_torn_down()
    }

    /// Whether another take may be captured from the stimulus phase.
    pub fn has_capacity(&self) -> bool {
        if self.slide.is_none() {
            return false;
        }
        match self.config.take_budget {
            TakeBudget::Lifetime => (self.takes_recorded as usize) < self.takes.capacity(),
            TakeBudget::Live => !self.takes.is_full(),
        }
    }

    /// Whether a re-record from review is allowed.
    pub fn can_rerecord(&self) -> bool {
        match self.config.take_budget {
            TakeBudget::Lifetime => self.has_capacity(),
            TakeBudget::Live => self.slide.is_some(),
        }
    }

    /// Whether discarding a take from review leaves a way forward.
    pub fn can_discard(&self) -> bool {
        self.takes.len() > 1 || self.can_rerecord()
    }

    pub fn affordances(&self) -> Affordances {
        let Some(playback) = self.playback.as_ref() else {
            return Affordances::default();
        };
        if self.scope.is_torn_down() {
            return Affordances::default();
        }

        let can_start_pass = playback.can_play();
        let can_submit = self.takes.selected().is_some();
        // Instant-response slides with no capacity left only offer submit.
        let submit_only = self.policy().is_some_and(|p| p.instant_response_required) && !self.has_capacity();

        match self.phase {
            Phase::Stimulus => Affordances {
                can_play_stimulus: !submit_only
                    && match playback.state() {
                        PlaybackState::Playing => false,
                        PlaybackState::Paused => true,
                        PlaybackState::Idle | PlaybackState::Ended => can_start_pass,
                    },
                can_record: self.has_capacity(),
                can_submit,
                ..Default::default()
            },
            Phase::Review => Affordances {
                can_rerecord: self.can_rerecord(),
                can_discard: self.can_discard(),
                can_watch_again: can_start_pass && self.has_capacity(),
                can_submit,
                ..Default::default()
            },
            Phase::Recording => {
                let recorder = self.scope.recorder();
                Affordances {
                    can_pause_recording: recorder.is_some_and(|r| r.is_recording()),
                    can_resume_recording: recorder.is_some_and(|r| r.is_paused()),
                    can_stop_recording: recorder.is_some(),
                    ..Default::default()
                }
            }
            Phase::Countdown | Phase::Submitted => Affordances::default(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let recorder = self.scope.recorder();
        EngineSnapshot {
            phase: self.phase,
            stimulus_loaded: self.playback.is_some(),
            awaiting_permission: self.scope.device().is_pending(),
            countdown_remaining: match self.phase {
                Phase::Countdown => self.scope.timers().countdown_remaining(),
                _ => None,
            },
            recording_elapsed_secs: recorder.map(|r| r.elapsed_secs()),
            recording_paused: recorder.is_some_and(|r| r.is_paused()),
            view_count: self.view_count(),
            takes: self.takes.summaries(),
            takes_recorded: self.takes_recorded,
            error: self.error.clone(),
            capability: self.capability(),
            affordances: self.affordances(),
        }
    }

    /// Release every resource of this slide instance. Idempotent; returns
    /// `None` when nothing was left to release.
    pub fn teardown(&mut self) -> Option<TeardownReport> {
        self.scope.teardown(&mut *self.ports.backend, &mut self.takes)
    }

    // --- Stimulus ---

    fn open_slide(&mut self) -> Result<(), CaptureError> {
        if self.playback.is_some() {
            return Err(invalid(self.phase, "open an already loaded slide"));
        }

        let loaded = self
            .ports
            .content
            .load_slide_config(&self.key.slide_id)
            .map_err(|e| match e {
                CaptureError::StimulusLoadFailure(_) => e,
                other => CaptureError::StimulusLoadFailure(other.to_string()),
            })
            .and_then(|config| {
                config.policy.validate().map_err(|m| {
                    CaptureError::StimulusLoadFailure(format!("invalid response policy: {}", m))
                })?;
                Ok(config)
            });
        let config = match loaded {
            Ok(config) => config,
            Err(e) => return Err(self.surface(e)),
        };

        let replay = match self.ports.store.load_view_state(&self.key) {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                log::warn!("[{}] Could not load view state, starting fresh: {}", self.key, e);
                ReplayState::default()
            }
        };

        self.takes = TakeRepository::new(
            config.policy.effective_max_takes(),
            self.handles.clone(),
            self.config.mime_type.clone(),
        );
        self.playback = Some(StimulusPlayback::new(config.stimulus.clone(), replay));
        log::info!(
            "[{}] Slide loaded: {} (views {}, max takes {}, {}s limit)",
            self.key,
            config.stimulus.url,
            replay.view_count,
            self.takes.capacity(),
            config.policy.max_duration_seconds
        );
        self.slide = Some(config);
        self.error = None;
        Ok(())
    }

    fn play_stimulus(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Stimulus], "play stimulus")?;
        if self.affordances_block_replay() {
            return Err(CaptureError::CapacityExhausted);
        }
        self.playback_mut()?.play()
    }

    fn affordances_block_replay(&self) -> bool {
        self.policy().is_some_and(|p| p.instant_response_required)
            && !self.has_capacity()
            && !self.takes.is_empty()
    }

    fn stimulus_ended(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Stimulus], "end stimulus")?;
        let Some(PlaybackEnd::Completed(state)) = self.playback_mut()?.ended() else {
            return Ok(());
        };
        self.record_view(state);

        let instant = self.policy().is_some_and(|p| p.instant_response_required);
        if instant {
            if self.has_capacity() {
                log::info!("[{}] Instant response: starting countdown", self.key);
                return self.enter_countdown();
            }
            log::info!("[{}] Instant response required but no capacity left", self.key);
        }
        Ok(())
    }

    fn record_view(&mut self, state: ReplayState) {
        if let Err(e) = self.ports.store.save_view_state(&self.key, state) {
            log::warn!("[{}] Failed to persist view state: {}", self.key, e);
            self.notify_error(&e);
        }
        mark_watched(self.ports.shared_state.as_ref(), &self.key);
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_view_count_changed(state.view_count);
        }
    }

    // --- Capture ---

    fn record(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Stimulus], "record")?;
        self.playback_mut()?;
        if !self.has_capacity() {
            return Err(CaptureError::CapacityExhausted);
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.pause();
        }
        self.enter_countdown()
    }

    fn rerecord(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Review], "re-record")?;
        if !self.can_rerecord() {
            return Err(CaptureError::CapacityExhausted);
        }
        self.enter_countdown()
    }

    fn enter_countdown(&mut self) -> Result<(), CaptureError> {
        self.error = None;
        self.set_phase(Phase::Countdown);
        self.scope.timers_mut().arm_countdown(self.config.countdown_ticks);

        match self.scope.acquire(&mut *self.ports.backend) {
            Ok(AcquireProgress::Pending) => {
                log::info!("[{}] Countdown waiting for camera permission", self.key);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(self.capture_failed(e)),
        }
    }

    fn acquisition_resolved(
        &mut self,
        ticket: AcquireTicket,
        result: Result<Box<dyn MediaStream>, CaptureError>,
    ) -> Result<(), CaptureError> {
        match self.scope.resolve(&mut *self.ports.backend, ticket, result) {
            Ok(AcquireProgress::Active) => {
                log::info!("[{}] Camera ready, countdown running", self.key);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) if self.phase == Phase::Countdown => Err(self.capture_failed(e)),
            Err(e) => {
                log::warn!("[{}] Acquisition failed outside countdown: {}", self.key, e);
                Ok(())
            }
        }
    }

    fn tick(&mut self) -> Result<(), CaptureError> {
        match self.phase {
            Phase::Countdown => self.countdown_tick(),
            Phase::Recording => self.recording_tick(),
            _ => Ok(()),
        }
    }

    fn countdown_tick(&mut self) -> Result<(), CaptureError> {
        // Frozen until the permission prompt is answered.
        if !self.scope.device().is_active() {
            return Ok(());
        }
        if !self.scope.device().is_live() {
            return self.device_lost(CaptureError::DeviceNotFound);
        }
        let Some(remaining) = self.scope.timers_mut().tick_countdown() else {
            return Ok(());
        };
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_countdown_tick(remaining);
        }
        if remaining == 0 {
            self.start_recording()
        } else {
            Ok(())
        }
    }

    fn start_recording(&mut self) -> Result<(), CaptureError> {
        self.scope.timers_mut().disarm_countdown();

        let key = self.key.to_string();
        let observer: ChunkObserver = Arc::new(move |len, count| {
            log::debug!("[{}] chunk {} ({} bytes)", key, count, len);
        });
        if let Err(e) = self.scope.start_recorder(self.config.tick_interval, Some(observer)) {
            return Err(self.capture_failed(e));
        }

        let limit = self.max_duration_secs();
        self.scope.timers_mut().arm_recording_limit(limit);
        self.set_phase(Phase::Recording);
        Ok(())
    }

    fn recording_tick(&mut self) -> Result<(), CaptureError> {
        if !self.scope.device().is_live() {
            return self.device_lost(CaptureError::DeviceNotFound);
        }
        let Some(ticked) = self.scope.tick_recorder() else {
            return Ok(());
        };
        let limit = self.max_duration_secs();
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_recording_progress(ticked, limit);
        }
        if self.scope.timers().limit_reached(ticked) {
            log::info!("[{}] Recording reached the {}s limit", self.key, limit);
            return self.stop_recording(StopReason::TimeLimit);
        }
        Ok(())
    }

    fn stop_recording(&mut self, reason: StopReason) -> Result<(), CaptureError> {
        let media = match self.scope.finish_recording(&mut *self.ports.backend) {
            Ok(media) => media,
            Err(e) => return Err(self.capture_failed(e)),
        };

        let duration = media.duration_secs.min(self.max_duration_secs());
        let outcome = match self.takes.add(media.bytes, duration) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.capture_failed(e)),
        };
        self.takes_recorded += 1;
        log::info!("[{}] {} recorded ({:?} stop)", self.key, outcome.id, reason);

        if let Some(delegate) = &self.ports.delegate {
            if let Some(evicted) = outcome.evicted {
                delegate.on_take_evicted(evicted);
            }
            if let Some(take) = self.takes.get(outcome.id) {
                delegate.on_take_added(&take.summary(true));
            }
        }

        self.set_phase(Phase::Review);
        Ok(())
    }

    /// End the capture pass after a failure and fall back to a phase with an
    /// actionable retry.
    fn capture_failed(&mut self, error: CaptureError) -> CaptureError {
        self.scope.release_capture(&mut *self.ports.backend);
        let fallback = if self.takes.is_empty() { Phase::Stimulus } else { Phase::Review };
        self.set_phase(fallback);
        self.surface(error)
    }

    /// Abandon the running pass. The partial recording is dropped.
    fn device_lost(&mut self, error: CaptureError) -> Result<(), CaptureError> {
        match self.phase {
            Phase::Countdown | Phase::Recording => {
                log::warn!("[{}] Capture device lost during {}", self.key, self.phase);
                Err(self.capture_failed(error))
            }
            _ => {
                log::debug!("[{}] Ignoring device failure in {}: {}", self.key, self.phase, error);
                Ok(())
            }
        }
    }

    // --- Review ---

    fn discard_take(&mut self, id: TakeId) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Review], "discard take")?;
        if self.takes.get(id).is_none() {
            return Err(CaptureError::UnknownTake(id.0));
        }
        // The last take may only go when another one can be recorded.
        if !self.can_discard() {
            return Err(CaptureError::CapacityExhausted);
        }
        self.takes.remove(id)?;
        log::info!("[{}] {} discarded", self.key, id);
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_take_removed(id);
        }
        Ok(())
    }

    fn watch_again(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Review], "watch again")?;
        if !self.has_capacity() {
            return Err(CaptureError::CapacityExhausted);
        }
        let playback = self.playback_mut()?;
        if !playback.can_play() {
            return Err(CaptureError::ReplayNotAllowed);
        }
        playback.play()?;
        self.set_phase(Phase::Stimulus);
        Ok(())
    }

    fn submit(&mut self) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Review, Phase::Stimulus], "submit")?;
        let take = self.takes.selected().ok_or(CaptureError::NoTakeSelected)?;
        let take_id = take.id;

        if let Err(e) = self.ports.store.submit_response(&self.key, take) {
            let error = match e {
                CaptureError::SubmissionFailure(_) => e,
                other => CaptureError::SubmissionFailure(other.to_string()),
            };
            return Err(self.surface(error));
        }

        log::info!("[{}] {} submitted", self.key, take_id);
        self.error = None;
        self.teardown();
        self.set_phase(Phase::Submitted);
        self.ports.navigation.on_response_submitted(&self.key);
        Ok(())
    }

    // --- Errors & exit ---

    fn retry(&mut self) -> Result<(), CaptureError> {
        let Some(kind) = self.error.as_ref().and_then(|overlay| overlay.retry) else {
            return Err(invalid(self.phase, "retry without a retryable error"));
        };
        self.error = None;
        match kind {
            RetryKind::Capture if self.phase == Phase::Review => self.rerecord(),
            RetryKind::Capture => self.record(),
            RetryKind::StimulusLoad => self.open_slide(),
            RetryKind::Submit => self.submit(),
        }
    }

    fn navigate_away(&mut self) -> Result<(), CaptureError> {
        log::info!("[{}] Leaving slide in {} phase", self.key, self.phase);
        self.teardown();
        self.ports.navigation.on_slide_left(&self.key);
        Ok(())
    }

    /// Record a user-visible error and report it.
    fn surface(&mut self, error: CaptureError) -> CaptureError {
        log::error!("[{}] {}", self.key, error);
        self.error = Some(ErrorOverlay::new(error.clone()));
        self.notify_error(&error);
        error
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_error(error);
        }
    }

    // --- Helpers ---

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("[{}] phase {} -> {}", self.key, from, to);
        self.phase = to;
        if let Some(delegate) = &self.ports.delegate {
            delegate.on_phase_changed(from, to);
        }
    }

    fn require_phase(&self, allowed: &[Phase], action: &str) -> Result<(), CaptureError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(invalid(self.phase, action))
        }
    }

    fn policy(&self) -> Option<&ResponsePolicy> {
        self.slide.as_ref().map(|s| &s.policy)
    }

    fn max_duration_secs(&self) -> f64 {
        self.policy().map(|p| p.max_duration_seconds as f64).unwrap_or(0.0)
    }

    fn playback_mut(&mut self) -> Result<&mut StimulusPlayback, CaptureError> {
        let phase = self.phase;
        self.playback
            .as_mut()
            .ok_or_else(|| invalid(phase, "use a stimulus that is not loaded"))
    }

    fn with_playback(
        &mut self,
        action: &str,
        f: impl FnOnce(&mut StimulusPlayback) -> Result<(), CaptureError>,
    ) -> Result<(), CaptureError> {
        self.require_phase(&[Phase::Stimulus], action)?;
        f(self.playback_mut()?)
    }
}

impl Drop for ResponseEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
