//! Simulated camera + microphone backend.
//!
//! Grants streams whose encoder runs on a dedicated producer thread and
//! delivers synthetic media chunks through the `ChunkCallback`. Permission
//! prompts, denials, busy devices and over-constrained requests are scripted
//! through a `CameraControl` handle the host keeps after boxing the camera
//! into the engine.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use response_capture_core::models::constraints::MediaConstraints;
use response_capture_core::models::error::CaptureError;
use response_capture_core::traits::capture_backend::{
    AcquireOutcome, AcquireTicket, CaptureBackend, ChunkCallback, Environment, MediaStream,
};

/// Marker at the start of every simulated recording.
pub const CONTAINER_HEADER: &[u8] = b"SIMWEBM\0";
/// Last chunk flushed synchronously when encoding stops.
pub const TRAILER: &[u8] = b"SIMEND\0";

/// How the simulated device answers the next stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Grant,
    /// The user declines the permission prompt.
    Deny,
    /// Another application holds the camera.
    Busy,
    NoDevice,
    /// Only minimal ("any camera") constraints can be satisfied.
    OverConstrained,
    /// Show a prompt; answer later through `CameraControl::answer`.
    Prompt,
    /// Grant a stream whose encoder never produces data.
    Silent,
}

struct CameraState {
    script: VecDeque<Behaviour>,
    fallback: Behaviour,
    pending: BTreeSet<u64>,
    next_ticket: u64,
    next_stream: u64,
    requests: u64,
    live: Vec<Arc<AtomicBool>>,
}

impl CameraState {
    fn grant(&mut self, silent: bool) -> SimulatedStream {
        self.next_stream += 1;
        let stream = SimulatedStream::new(format!("sim-camera-{}", self.next_stream), silent);
        self.live.push(Arc::clone(&stream.live));
        stream
    }
}

/// Host-side handle for scripting and answering the camera.
#[derive(Clone)]
pub struct CameraControl {
    state: Arc<Mutex<CameraState>>,
}

impl CameraControl {
    /// Queue the answer to a future request.
    pub fn push(&self, behaviour: Behaviour) {
        self.state.lock().script.push_back(behaviour);
    }

    /// Answer a pending permission prompt. Returns `None` when the ticket
    /// was cancelled or already answered.
    pub fn answer(
        &self,
        ticket: AcquireTicket,
        allow: bool,
    ) -> Option<Result<Box<dyn MediaStream>, CaptureError>> {
        let mut state = self.state.lock();
        if !state.pending.remove(&ticket.0) {
            return None;
        }
        if !allow {
            log::info!("Simulated prompt {:?} denied", ticket);
            return Some(Err(CaptureError::PermissionDenied));
        }
        log::info!("Simulated prompt {:?} allowed", ticket);
        Some(Ok(Box::new(state.grant(false))))
    }

    /// Tickets of prompts still waiting for an answer.
    pub fn pending_prompts(&self) -> Vec<AcquireTicket> {
        self.state.lock().pending.iter().map(|t| AcquireTicket(*t)).collect()
    }

    pub fn requests(&self) -> u64 {
        self.state.lock().requests
    }

    /// End every live stream from the device side, as when the camera is
    /// unplugged. Returns how many streams were cut.
    pub fn unplug(&self) -> usize {
        let state = self.state.lock();
        let cut = state
            .live
            .iter()
            .filter(|live| live.swap(false, Ordering::SeqCst))
            .count();
        if cut > 0 {
            log::warn!("Simulated camera unplugged, {} stream(s) ended", cut);
        }
        cut
    }

    /// Streams whose tracks are still running.
    pub fn live_streams(&self) -> usize {
        self.state
            .lock()
            .live
            .iter()
            .filter(|live| live.load(Ordering::SeqCst))
            .count()
    }
}

/// A `CaptureBackend` backed by synthetic streams.
pub struct SimulatedCamera {
    environment: Environment,
    state: Arc<Mutex<CameraState>>,
}

impl SimulatedCamera {
    /// A capable camera that grants every request unless scripted otherwise.
    pub fn new() -> (Self, CameraControl) {
        Self::with_environment(Environment::fully_capable(), Behaviour::Grant)
    }

    pub fn with_environment(environment: Environment, fallback: Behaviour) -> (Self, CameraControl) {
        let state = Arc::new(Mutex::new(CameraState {
            script: VecDeque::new(),
            fallback,
            pending: BTreeSet::new(),
            next_ticket: 1,
            next_stream: 0,
            requests: 0,
            live: Vec::new(),
        }));
        let control = CameraControl {
            state: Arc::clone(&state),
        };
        (Self { environment, state }, control)
    }
}

impl CaptureBackend for SimulatedCamera {
    fn environment(&self) -> Environment {
        self.environment
    }

    fn request_stream(&mut self, constraints: &MediaConstraints) -> AcquireOutcome {
        let mut state = self.state.lock();
        state.requests += 1;
        let behaviour = state.script.pop_front().unwrap_or(state.fallback);
        log::debug!("Simulated camera request {} answered with {:?}", state.requests, behaviour);

        match behaviour {
            Behaviour::Grant => AcquireOutcome::Granted(Box::new(state.grant(false))),
            Behaviour::Silent => AcquireOutcome::Granted(Box::new(state.grant(true))),
            Behaviour::Deny => AcquireOutcome::Failed(CaptureError::PermissionDenied),
            Behaviour::Busy => AcquireOutcome::Failed(CaptureError::DeviceBusy),
            Behaviour::NoDevice => AcquireOutcome::Failed(CaptureError::DeviceNotFound),
            Behaviour::OverConstrained if constraints.is_minimal() => {
                AcquireOutcome::Granted(Box::new(state.grant(false)))
            }
            Behaviour::OverConstrained => AcquireOutcome::Failed(CaptureError::ConstraintsUnsatisfiable),
            Behaviour::Prompt => {
                let ticket = state.next_ticket;
                state.next_ticket += 1;
                state.pending.insert(ticket);
                AcquireOutcome::Pending(AcquireTicket(ticket))
            }
        }
    }

    fn cancel_request(&mut self, ticket: AcquireTicket) {
        if self.state.lock().pending.remove(&ticket.0) {
            log::info!("Simulated prompt {:?} dismissed", ticket);
        }
    }
}

/// A granted synthetic camera + microphone stream.
///
/// While encoding, a producer thread emits one chunk per timeslice unless
/// paused. `stop_encoding` joins the thread, then flushes `TRAILER`
/// synchronously so the recorder sees every chunk before it finalizes.
pub struct SimulatedStream {
    id: String,
    silent: bool,
    live: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    sequence: Arc<AtomicU64>,
    callback: Option<ChunkCallback>,
    producer: Option<thread::JoinHandle<()>>,
}

impl SimulatedStream {
    fn new(id: String, silent: bool) -> Self {
        Self {
            id,
            silent,
            live: Arc::new(AtomicBool::new(true)),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            sequence: Arc::new(AtomicU64::new(0)),
            callback: None,
            producer: None,
        }
    }

    /// Chunks emitted so far (trailer included).
    pub fn chunks_emitted(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn join_producer(&mut self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
        was_running
    }
}

impl MediaStream for SimulatedStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn start_encoding(&mut self, timeslice: Duration, callback: ChunkCallback) -> Result<(), CaptureError> {
        if !self.is_live() {
            return Err(CaptureError::DeviceNotFound);
        }
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(format!("{} is already encoding", self.id)));
        }

        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.callback = Some(Arc::clone(&callback));

        let live = Arc::clone(&self.live);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let sequence = Arc::clone(&self.sequence);
        let silent = self.silent;
        let id = self.id.clone();

        let handle = thread::Builder::new()
            .name(format!("{}-encoder", self.id))
            .spawn(move || producer_loop(id, timeslice, silent, live, running, paused, sequence, callback))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::ConfigurationFailed(format!("failed to spawn encoder thread: {}", e))
            })?;

        self.producer = Some(handle);
        log::debug!("{} encoding every {:?}", self.id, timeslice);
        Ok(())
    }

    fn pause_encoding(&mut self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume_encoding(&mut self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn stop_encoding(&mut self) {
        if !self.join_producer() {
            return;
        }
        if let Some(callback) = self.callback.take() {
            if !self.silent {
                self.sequence.fetch_add(1, Ordering::SeqCst);
                callback(TRAILER.to_vec());
            }
        }
        log::debug!("{} encoder stopped after {} chunks", self.id, self.chunks_emitted());
    }

    fn stop_tracks(&mut self) {
        self.join_producer();
        self.callback = None;
        if self.live.swap(false, Ordering::SeqCst) {
            log::info!("{} tracks stopped", self.id);
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Producer thread body: one chunk per timeslice while running.
fn producer_loop(
    id: String,
    timeslice: Duration,
    silent: bool,
    live: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    sequence: Arc<AtomicU64>,
    callback: ChunkCallback,
) {
    let poll = Duration::from_millis(5).min(timeslice);
    let mut slice_start = Instant::now();

    while running.load(Ordering::SeqCst) {
        thread::sleep(poll);
        if !live.load(Ordering::SeqCst) {
            log::debug!("{} lost its device, encoder idle", id);
            break;
        }
        if slice_start.elapsed() < timeslice {
            continue;
        }
        slice_start = Instant::now();
        if silent || paused.load(Ordering::SeqCst) {
            continue;
        }

        let seq = sequence.fetch_add(1, Ordering::SeqCst);
        let mut chunk = Vec::new();
        if seq == 0 {
            chunk.extend_from_slice(CONTAINER_HEADER);
        }
        chunk.extend_from_slice(format!("{} cluster {}\n", id, seq).as_bytes());
        callback(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLICE: Duration = Duration::from_millis(10);

    fn collector() -> (ChunkCallback, Arc<Mutex<Vec<Vec<u8>>>>) {
        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&chunks);
        (Arc::new(move |chunk| sink.lock().push(chunk)), chunks)
    }

    fn granted(outcome: AcquireOutcome) -> Box<dyn MediaStream> {
        match outcome {
            AcquireOutcome::Granted(stream) => stream,
            other => panic!("expected a stream, got {:?}", other),
        }
    }

    #[test]
    fn encoder_delivers_header_clusters_and_trailer() {
        let (mut camera, control) = SimulatedCamera::new();
        let mut stream = granted(camera.request_stream(&MediaConstraints::preferred()));
        let (callback, chunks) = collector();

        stream.start_encoding(SLICE, callback).unwrap();
        thread::sleep(Duration::from_millis(80));
        stream.stop_encoding();

        let chunks = chunks.lock();
        assert!(chunks.len() >= 2);
        assert!(chunks[0].starts_with(CONTAINER_HEADER));
        assert_eq!(chunks.last().unwrap().as_slice(), TRAILER);

        stream.stop_tracks();
        stream.stop_tracks();
        assert!(!stream.is_live());
        assert_eq!(control.live_streams(), 0);
    }

    #[test]
    fn no_chunks_after_stop() {
        let (mut camera, _control) = SimulatedCamera::new();
        let mut stream = granted(camera.request_stream(&MediaConstraints::preferred()));
        let (callback, chunks) = collector();

        stream.start_encoding(SLICE, callback).unwrap();
        thread::sleep(Duration::from_millis(30));
        stream.stop_encoding();
        let count = chunks.lock().len();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(chunks.lock().len(), count);
    }

    #[test]
    fn silent_stream_produces_nothing() {
        let (mut camera, control) = SimulatedCamera::new();
        control.push(Behaviour::Silent);
        let mut stream = granted(camera.request_stream(&MediaConstraints::preferred()));
        let (callback, chunks) = collector();

        stream.start_encoding(SLICE, callback).unwrap();
        thread::sleep(Duration::from_millis(40));
        stream.stop_encoding();
        assert!(chunks.lock().is_empty());
    }

    #[test]
    fn over_constrained_only_grants_minimal_requests() {
        let (mut camera, control) = SimulatedCamera::new();
        control.push(Behaviour::OverConstrained);
        control.push(Behaviour::OverConstrained);

        assert!(matches!(
            camera.request_stream(&MediaConstraints::preferred()),
            AcquireOutcome::Failed(CaptureError::ConstraintsUnsatisfiable)
        ));
        assert!(matches!(
            camera.request_stream(&MediaConstraints::minimal()),
            AcquireOutcome::Granted(_)
        ));
        assert_eq!(control.requests(), 2);
    }

    #[test]
    fn scripted_failures() {
        let (mut camera, control) = SimulatedCamera::new();
        control.push(Behaviour::Deny);
        control.push(Behaviour::Busy);
        control.push(Behaviour::NoDevice);
        let c = MediaConstraints::preferred();

        assert!(matches!(camera.request_stream(&c), AcquireOutcome::Failed(CaptureError::PermissionDenied)));
        assert!(matches!(camera.request_stream(&c), AcquireOutcome::Failed(CaptureError::DeviceBusy)));
        assert!(matches!(camera.request_stream(&c), AcquireOutcome::Failed(CaptureError::DeviceNotFound)));
        assert!(matches!(camera.request_stream(&c), AcquireOutcome::Granted(_)));
    }

    #[test]
    fn prompt_is_answered_once_and_cancel_wins() {
        let (mut camera, control) = SimulatedCamera::new();
        control.push(Behaviour::Prompt);
        control.push(Behaviour::Prompt);
        let c = MediaConstraints::preferred();

        let AcquireOutcome::Pending(first) = camera.request_stream(&c) else {
            panic!("expected a prompt");
        };
        let AcquireOutcome::Pending(second) = camera.request_stream(&c) else {
            panic!("expected a prompt");
        };
        assert_eq!(control.pending_prompts(), vec![first, second]);

        assert!(matches!(control.answer(first, true), Some(Ok(_))));
        assert!(control.answer(first, true).is_none());

        camera.cancel_request(second);
        assert!(control.answer(second, true).is_none());
        assert!(control.pending_prompts().is_empty());
    }

    #[test]
    fn denied_prompt_reports_permission_error() {
        let (mut camera, control) = SimulatedCamera::new();
        control.push(Behaviour::Prompt);
        let AcquireOutcome::Pending(ticket) = camera.request_stream(&MediaConstraints::preferred()) else {
            panic!("expected a prompt");
        };
        assert!(matches!(control.answer(ticket, false), Some(Err(CaptureError::PermissionDenied))));
    }

    #[test]
    fn unplug_ends_live_streams() {
        let (mut camera, control) = SimulatedCamera::new();
        let mut stream = granted(camera.request_stream(&MediaConstraints::preferred()));
        let (callback, _chunks) = collector();
        stream.start_encoding(SLICE, callback).unwrap();

        assert_eq!(control.unplug(), 1);
        assert!(!stream.is_live());
        assert_eq!(control.live_streams(), 0);
        assert_eq!(control.unplug(), 0);
        stream.stop_tracks();
    }

    #[test]
    fn dropping_a_stream_stops_its_tracks() {
        let (mut camera, control) = SimulatedCamera::new();
        let stream = granted(camera.request_stream(&MediaConstraints::preferred()));
        assert_eq!(control.live_streams(), 1);
        drop(stream);
        assert_eq!(control.live_streams(), 0);
    }
}
