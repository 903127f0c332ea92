//! Deterministic fakes for every engine port.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::constraints::MediaConstraints;
use crate::models::error::CaptureError;
use crate::models::phase::Phase;
use crate::models::policy::ResponsePolicy;
use crate::models::stimulus::{ReplayState, SlideConfig, SlideKey, StimulusVideo};
use crate::models::take::{Take, TakeId, TakeSummary};
use crate::traits::capture_backend::{
    AcquireOutcome, AcquireTicket, CaptureBackend, ChunkCallback, Environment, MediaStream,
};
use crate::traits::engine_delegate::EngineDelegate;
use crate::traits::ports::{ContentProvider, NavigationHost, ResponseStore};

// -- Media stream --

#[derive(Default)]
struct StreamState {
    live: bool,
    encoding: bool,
    paused: bool,
    stop_tracks_calls: u32,
    callback: Option<ChunkCallback>,
    trailing_chunk: Option<Vec<u8>>,
}

/// Test-side view of a `FakeStream`.
#[derive(Clone)]
pub struct StreamProbe {
    id: String,
    inner: Arc<Mutex<StreamState>>,
}

impl StreamProbe {
    /// Deliver a chunk as the encoder would.
    pub fn emit(&self, chunk: &[u8]) {
        let callback = self.inner.lock().callback.clone();
        if let Some(cb) = callback {
            cb(chunk.to_vec());
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_live(&self) -> bool {
        self.inner.lock().live
    }

    pub fn is_encoding(&self) -> bool {
        self.inner.lock().encoding
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    /// End the tracks from the device side, as an unplugged camera would.
    pub fn unplug(&self) {
        self.inner.lock().live = false;
    }

    pub fn stop_tracks_calls(&self) -> u32 {
        self.inner.lock().stop_tracks_calls
    }
}

pub struct FakeStream {
    id: String,
    inner: Arc<Mutex<StreamState>>,
}

impl FakeStream {
    pub fn new(id: &str, trailing_chunk: Option<Vec<u8>>) -> (Self, StreamProbe) {
        let inner = Arc::new(Mutex::new(StreamState {
            live: true,
            trailing_chunk,
            ..Default::default()
        }));
        let probe = StreamProbe {
            id: id.to_string(),
            inner: Arc::clone(&inner),
        };
        (Self { id: id.to_string(), inner }, probe)
    }
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.inner.lock().live
    }

    fn start_encoding(&mut self, _timeslice: Duration, callback: ChunkCallback) -> Result<(), CaptureError> {
        let mut s = self.inner.lock();
        if !s.live {
            return Err(CaptureError::DeviceNotFound);
        }
        s.encoding = true;
        s.callback = Some(callback);
        Ok(())
    }

    fn pause_encoding(&mut self) {
        self.inner.lock().paused = true;
    }

    fn resume_encoding(&mut self) {
        self.inner.lock().paused = false;
    }

    fn stop_encoding(&mut self) {
        let (callback, trailing) = {
            let mut s = self.inner.lock();
            if !s.encoding {
                return;
            }
            s.encoding = false;
            (s.callback.clone(), s.trailing_chunk.clone())
        };
        if let (Some(cb), Some(chunk)) = (callback, trailing) {
            cb(chunk);
        }
    }

    fn stop_tracks(&mut self) {
        let mut s = self.inner.lock();
        s.live = false;
        s.stop_tracks_calls += 1;
    }
}

// -- Capture backend --

/// One scripted answer to `request_stream`.
pub enum Script {
    Grant,
    Fail(CaptureError),
    Pending,
}

struct BackendState {
    script: VecDeque<Script>,
    requests: Vec<MediaConstraints>,
    cancelled: Vec<AcquireTicket>,
    streams: Vec<StreamProbe>,
    next_ticket: u64,
    trailing_chunk: Option<Vec<u8>>,
}

#[derive(Clone)]
pub struct BackendProbe {
    inner: Arc<Mutex<BackendState>>,
}

impl BackendProbe {
    pub fn push(&self, script: Script) {
        self.inner.lock().script.push_back(script);
    }

    /// Chunk flushed by every new stream on `stop_encoding` (None = silent).
    pub fn set_trailing_chunk(&self, chunk: Option<Vec<u8>>) {
        self.inner.lock().trailing_chunk = chunk;
    }

    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.inner.lock().requests.clone()
    }

    pub fn cancelled(&self) -> Vec<AcquireTicket> {
        self.inner.lock().cancelled.clone()
    }

    pub fn streams(&self) -> Vec<StreamProbe> {
        self.inner.lock().streams.clone()
    }

    pub fn last_stream(&self) -> StreamProbe {
        self.streams().last().cloned().expect("no stream granted yet")
    }

    pub fn live_streams(&self) -> usize {
        self.streams().iter().filter(|s| s.is_live()).count()
    }

    /// A stream to hand back through `AcquisitionResolved`.
    pub fn make_stream(&self) -> Box<dyn MediaStream> {
        let mut s = self.inner.lock();
        let id = format!("stream-{}", s.streams.len() + 1);
        let (stream, probe) = FakeStream::new(&id, s.trailing_chunk.clone());
        s.streams.push(probe);
        Box::new(stream)
    }
}

pub struct ScriptedBackend {
    env: Environment,
    probe: BackendProbe,
}

impl ScriptedBackend {
    pub fn new() -> (Self, BackendProbe) {
        Self::with_environment(Environment::fully_capable())
    }

    pub fn with_environment(env: Environment) -> (Self, BackendProbe) {
        let probe = BackendProbe {
            inner: Arc::new(Mutex::new(BackendState {
                script: VecDeque::new(),
                requests: Vec::new(),
                cancelled: Vec::new(),
                streams: Vec::new(),
                next_ticket: 1,
                trailing_chunk: Some(b"tail".to_vec()),
            })),
        };
        (Self { env, probe: probe.clone() }, probe)
    }
}

impl CaptureBackend for ScriptedBackend {
    fn environment(&self) -> Environment {
        self.env
    }

    fn request_stream(&mut self, constraints: &MediaConstraints) -> AcquireOutcome {
        let script = {
            let mut s = self.probe.inner.lock();
            s.requests.push(constraints.clone());
            s.script.pop_front().unwrap_or(Script::Grant)
        };
        match script {
            Script::Grant => AcquireOutcome::Granted(self.probe.make_stream()),
            Script::Fail(err) => AcquireOutcome::Failed(err),
            Script::Pending => {
                let mut s = self.probe.inner.lock();
                let ticket = AcquireTicket(s.next_ticket);
                s.next_ticket += 1;
                AcquireOutcome::Pending(ticket)
            }
        }
    }

    fn cancel_request(&mut self, ticket: AcquireTicket) {
        self.probe.inner.lock().cancelled.push(ticket);
    }
}

// -- Content provider --

pub fn stimulus(allow_replay: bool, max_replays: u32) -> StimulusVideo {
    StimulusVideo {
        url: "https://cdn.example/prompt.mp4".into(),
        title: Some("Prompt".into()),
        context_text: None,
        allow_replay,
        max_replays,
    }
}

pub fn policy(allow_multiple_takes: bool, max_takes: u32, instant: bool) -> ResponsePolicy {
    ResponsePolicy {
        allow_multiple_takes,
        max_takes,
        max_duration_seconds: 5,
        instant_response_required: instant,
    }
}

pub struct StaticContent {
    config: SlideConfig,
    failures: Arc<Mutex<u32>>,
}

impl StaticContent {
    pub fn new(stimulus: StimulusVideo, policy: ResponsePolicy) -> Self {
        Self {
            config: SlideConfig { stimulus, policy },
            failures: Arc::new(Mutex::new(0)),
        }
    }

    /// Fail the next `n` loads.
    pub fn failing(mut self, n: u32) -> Self {
        self.failures = Arc::new(Mutex::new(n));
        self
    }
}

impl ContentProvider for StaticContent {
    fn load_slide_config(&self, slide_id: &str) -> Result<SlideConfig, CaptureError> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(CaptureError::StimulusLoadFailure(format!("{} unavailable", slide_id)));
        }
        Ok(self.config.clone())
    }
}

// -- Response store --

#[derive(Default)]
pub struct StoreState {
    pub view_states: HashMap<SlideKey, ReplayState>,
    pub submissions: Vec<(SlideKey, TakeId, Vec<u8>)>,
    pub fail_submissions: u32,
    pub fail_view_saves: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl ResponseStore for MemoryStore {
    fn load_view_state(&self, key: &SlideKey) -> Result<Option<ReplayState>, CaptureError> {
        Ok(self.state.lock().view_states.get(key).copied())
    }

    fn save_view_state(&self, key: &SlideKey, state: ReplayState) -> Result<(), CaptureError> {
        let mut s = self.state.lock();
        if s.fail_view_saves {
            return Err(CaptureError::StorageError("view state store offline".into()));
        }
        s.view_states.insert(key.clone(), state);
        Ok(())
    }

    fn submit_response(&self, key: &SlideKey, take: &Take) -> Result<(), CaptureError> {
        let mut s = self.state.lock();
        if s.fail_submissions > 0 {
            s.fail_submissions -= 1;
            return Err(CaptureError::StorageError("upload failed".into()));
        }
        s.submissions.push((key.clone(), take.id, take.media_bytes.clone()));
        Ok(())
    }
}

// -- Navigation host --

#[derive(Default)]
pub struct NavigationLog {
    pub submitted: u32,
    pub left: u32,
    /// Live streams observed when the callback ran.
    pub live_streams_at_callback: Vec<usize>,
}

#[derive(Clone)]
pub struct NavigationSpy {
    pub log: Arc<Mutex<NavigationLog>>,
    backend: BackendProbe,
}

impl NavigationSpy {
    pub fn new(backend: BackendProbe) -> Self {
        Self {
            log: Arc::new(Mutex::new(NavigationLog::default())),
            backend,
        }
    }
}

impl NavigationHost for NavigationSpy {
    fn on_response_submitted(&self, _key: &SlideKey) {
        let live = self.backend.live_streams();
        let mut log = self.log.lock();
        log.submitted += 1;
        log.live_streams_at_callback.push(live);
    }

    fn on_slide_left(&self, _key: &SlideKey) {
        let live = self.backend.live_streams();
        let mut log = self.log.lock();
        log.left += 1;
        log.live_streams_at_callback.push(live);
    }
}

// -- Delegate --

#[derive(Default)]
pub struct RecordingDelegate {
    pub events: Mutex<Vec<String>>,
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = Vec::new();
        for e in self.events() {
            if let Some(rest) = e.strip_prefix("phase:") {
                phases.push(match rest {
                    "stimulus" => Phase::Stimulus,
                    "countdown" => Phase::Countdown,
                    "recording" => Phase::Recording,
                    "review" => Phase::Review,
                    _ => Phase::Submitted,
                });
            }
        }
        phases
    }
}

impl EngineDelegate for RecordingDelegate {
    fn on_phase_changed(&self, _from: Phase, to: Phase) {
        self.events.lock().push(format!("phase:{}", to));
    }

    fn on_countdown_tick(&self, remaining: u32) {
        self.events.lock().push(format!("countdown:{}", remaining));
    }

    fn on_view_count_changed(&self, view_count: u32) {
        self.events.lock().push(format!("views:{}", view_count));
    }

    fn on_take_added(&self, take: &TakeSummary) {
        self.events.lock().push(format!("added:{}", take.id.0));
    }

    fn on_take_evicted(&self, id: TakeId) {
        self.events.lock().push(format!("evicted:{}", id.0));
    }

    fn on_take_removed(&self, id: TakeId) {
        self.events.lock().push(format!("removed:{}", id.0));
    }

    fn on_error(&self, error: &CaptureError) {
        self.events.lock().push(format!("error:{}", error));
    }
}
