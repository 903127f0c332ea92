//! End-to-end walk through one stimulus + video-response slide.
//!
//! Watches the prompt, records an instant response that runs into the time
//! limit, re-records through a permission prompt with a pause in the middle,
//! then submits the first take to an encrypted on-disk store.
//!
//! Usage: `capture-demo [output-dir]` (set `RUST_LOG=info` to follow along).

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use response_capture_core::storage::metadata::read_metadata;
use response_capture_core::{
    Action, CaptureError, EngineConfig, EngineDelegate, EnginePorts, FileResponseStore, MemoryKeyValueStore,
    NavigationHost, Phase, ResponseEngine, SlideKey, StorageConfig, TakeId, TakeSummary,
};
use response_capture_sim::{AesGcmTakeEncryptor, Behaviour, CameraControl, JsonContentProvider, Metronome, SimulatedCamera};

const SLIDE_ID: &str = "greeting";
const SLIDE_JSON: &str = r#"{
    "stimulus": {
        "url": "https://cdn.example/prompts/greeting.mp4",
        "title": "Introduce yourself",
        "allowReplay": true,
        "maxReplays": 1
    },
    "policy": {
        "allowMultipleTakes": true,
        "maxTakes": 2,
        "maxDurationSeconds": 3,
        "instantResponseRequired": true
    }
}"#;
const TICK: Duration = Duration::from_millis(200);
const MAX_TICKS: u64 = 300;

enum DemoEvent {
    Tick(u64),
    Submitted(SlideKey),
}

// -- Event payloads --

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum Payload<'a> {
    PhaseChanged { from: String, to: String },
    Countdown { remaining: u32 },
    Progress { elapsed_secs: f64, max_secs: f64 },
    Views { view_count: u32 },
    TakeAdded { id: u64, duration_secs: f64, size_bytes: usize },
    TakeEvicted { id: u64 },
    Error { message: &'a str },
}

/// Logs engine events as JSON lines.
struct ConsoleDelegate;

impl ConsoleDelegate {
    fn emit(&self, payload: Payload<'_>) {
        match serde_json::to_string(&payload) {
            Ok(json) => log::info!("event {}", json),
            Err(e) => log::warn!("unserializable event: {}", e),
        }
    }
}

impl EngineDelegate for ConsoleDelegate {
    fn on_phase_changed(&self, from: Phase, to: Phase) {
        self.emit(Payload::PhaseChanged {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    fn on_countdown_tick(&self, remaining: u32) {
        self.emit(Payload::Countdown { remaining });
    }

    fn on_recording_progress(&self, elapsed_secs: f64, max_secs: f64) {
        self.emit(Payload::Progress { elapsed_secs, max_secs });
    }

    fn on_view_count_changed(&self, view_count: u32) {
        self.emit(Payload::Views { view_count });
    }

    fn on_take_added(&self, take: &TakeSummary) {
        self.emit(Payload::TakeAdded {
            id: take.id.0,
            duration_secs: take.duration_secs,
            size_bytes: take.size_bytes,
        });
    }

    fn on_take_evicted(&self, id: TakeId) {
        self.emit(Payload::TakeEvicted { id: id.0 });
    }

    fn on_error(&self, error: &CaptureError) {
        let message = error.to_string();
        self.emit(Payload::Error { message: &message });
    }
}

/// Hands the submission back to the demo loop.
struct ChannelNavigation {
    tx: Sender<DemoEvent>,
}

impl NavigationHost for ChannelNavigation {
    fn on_response_submitted(&self, key: &SlideKey) {
        let _ = self.tx.send(DemoEvent::Submitted(key.clone()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FirstTake,
    AwaitPrompt,
    SecondTake,
    Done,
}

/// Plays the user's part, one tick at a time.
struct Director {
    stage: Stage,
    stage_ticks: u32,
    camera: CameraControl,
}

impl Director {
    fn after_tick(&mut self, engine: &mut ResponseEngine) -> Result<(), CaptureError> {
        self.stage_ticks += 1;
        match (self.stage, engine.phase()) {
            (Stage::FirstTake, Phase::Review) => {
                log::info!("First take done; re-recording behind a permission prompt");
                self.camera.push(Behaviour::Prompt);
                engine.dispatch(Action::ReRecord)?;
                self.advance(Stage::AwaitPrompt);
            }
            (Stage::AwaitPrompt, _) if self.stage_ticks >= 2 => {
                for ticket in self.camera.pending_prompts() {
                    if let Some(result) = self.camera.answer(ticket, true) {
                        engine.dispatch(Action::AcquisitionResolved { ticket, result })?;
                    }
                }
                self.advance(Stage::SecondTake);
            }
            (Stage::SecondTake, Phase::Recording) => match self.stage_ticks {
                4 => engine.dispatch(Action::PauseRecording)?,
                7 => engine.dispatch(Action::ResumeRecording)?,
                9 => engine.dispatch(Action::StopRecording)?,
                _ => {}
            },
            (Stage::SecondTake, Phase::Review) => {
                let first = engine
                    .takes()
                    .ids()
                    .first()
                    .copied()
                    .ok_or(CaptureError::NoTakeSelected)?;
                for take in engine.takes().summaries() {
                    log::info!("  {} {:.1}s {} bytes {}", take.id, take.duration_secs, take.size_bytes, take.url);
                }
                engine.dispatch(Action::SelectTake(first))?;
                engine.dispatch(Action::Submit)?;
                self.advance(Stage::Done);
            }
            _ => {}
        }
        Ok(())
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        self.stage_ticks = 0;
    }
}

fn run(out_dir: PathBuf) -> Result<(), CaptureError> {
    let (tx, rx) = mpsc::channel();
    let (camera, control) = SimulatedCamera::new();
    // The preferred 720p request is refused; the fallback request succeeds.
    control.push(Behaviour::OverConstrained);

    let encryptor = AesGcmTakeEncryptor::demo();
    let storage = StorageConfig::new(&out_dir).with_encryptor(Box::new(encryptor.clone()));
    let ports = EnginePorts {
        content: Box::new(JsonContentProvider::new().with_document(SLIDE_ID, SLIDE_JSON)),
        backend: Box::new(camera),
        store: Box::new(FileResponseStore::new(storage.clone())),
        shared_state: Arc::new(MemoryKeyValueStore::new()),
        navigation: Box::new(ChannelNavigation { tx: tx.clone() }),
        delegate: Some(Arc::new(ConsoleDelegate)),
    };
    let config = EngineConfig {
        tick_interval: TICK,
        ..EngineConfig::for_user("demo-user")
    };

    let mut engine = ResponseEngine::new(config, SLIDE_ID, ports)?;
    engine.open()?;

    engine.dispatch(Action::PlayStimulus)?;
    for second in 1..=5 {
        engine.dispatch(Action::StimulusProgress {
            position_secs: second as f64,
        })?;
    }
    engine.dispatch(Action::StimulusEnded)?;

    let mut director = Director {
        stage: Stage::FirstTake,
        stage_ticks: 0,
        camera: control.clone(),
    };
    let mut metronome = Metronome::start(TICK, move |n| {
        let _ = tx.send(DemoEvent::Tick(n));
    })?;

    let mut submitted = None;
    for event in rx.iter() {
        match event {
            DemoEvent::Tick(n) if n > MAX_TICKS => break,
            DemoEvent::Tick(_) => {
                engine.dispatch(Action::Tick)?;
                director.after_tick(&mut engine)?;
            }
            DemoEvent::Submitted(key) => {
                submitted = Some(key);
                break;
            }
        }
    }
    metronome.stop();

    let key = submitted.ok_or_else(|| CaptureError::SubmissionFailure("demo did not reach submission".into()))?;
    log::info!("Submitted {}; live camera streams: {}", key, control.live_streams());
    verify_submission(&FileResponseStore::new(storage), &key, &encryptor)
}

/// Read the stored take back and check it against its sidecar.
fn verify_submission(
    store: &FileResponseStore,
    key: &SlideKey,
    encryptor: &AesGcmTakeEncryptor,
) -> Result<(), CaptureError> {
    let dir = store.slide_dir(key);
    let entries = fs::read_dir(&dir).map_err(|e| CaptureError::StorageError(e.to_string()))?;
    for entry in entries {
        let path = entry.map_err(|e| CaptureError::StorageError(e.to_string()))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("enc") {
            continue;
        }
        let metadata = read_metadata(&path)?;
        let sealed = fs::read(&path).map_err(|e| CaptureError::StorageError(e.to_string()))?;
        let plain = encryptor.decrypt_chunked(&sealed).map_err(CaptureError::EncryptionFailed)?;
        if plain.len() != metadata.size_bytes {
            return Err(CaptureError::StorageError(format!(
                "{} decrypted to {} bytes, metadata says {}",
                path.display(),
                plain.len(),
                metadata.size_bytes
            )));
        }
        log::info!(
            "Verified {} (take {}, {:.1}s, {} bytes, sha256 {})",
            metadata.file_name,
            metadata.take_id,
            metadata.duration_secs,
            metadata.size_bytes,
            metadata.checksum
        );
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("response-capture-demo"));

    if let Err(e) = run(out_dir.clone()) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
    log::info!("Demo complete; output in {}", out_dir.display());
}
