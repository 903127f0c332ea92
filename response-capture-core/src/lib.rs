//! # response-capture-core
//!
//! Platform-agnostic stimulus-video / timed video-response capture engine.
//!
//! A slide instance shows a prompt video under replay limits, counts down,
//! records a bounded answer from the camera and microphone, keeps one or more
//! takes under a capacity limit, and hands the selected take to storage.
//! Hosts implement the `CaptureBackend` and port traits and feed every event
//! through `ResponseEngine::dispatch`.
//!
//! ## Architecture
//!
//! ```text
//! response-capture-core (this crate)
//! ├── traits/    ← CaptureBackend, MediaStream, ports, EngineDelegate, TakeEncryptor
//! ├── models/    ← CaptureError, Phase, EngineConfig, ResponsePolicy, Take, etc.
//! ├── probe/     ← capability check
//! ├── device/    ← CaptureDeviceSession (acquire with fallback, release)
//! ├── recorder/  ← ChunkBuffer, Recorder
//! ├── takes/     ← HandleRegistry, TakeRepository
//! ├── stimulus/  ← ReplayPolicy, StimulusPlayback, watched flag
//! ├── engine/    ← ResponseEngine, ResourceScope, TimerSet
//! └── storage/   ← FileResponseStore, TakeWriter, metadata, MemoryKeyValueStore
//! ```

pub mod device;
pub mod engine;
pub mod models;
pub mod probe;
pub mod recorder;
pub mod stimulus;
pub mod storage;
pub mod takes;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use engine::lifecycle::TeardownReport;
pub use engine::machine::{Action, EnginePorts, ResponseEngine};
pub use models::config::EngineConfig;
pub use models::constraints::{FacingMode, MediaConstraints, VideoConstraints};
pub use models::error::CaptureError;
pub use models::phase::{Affordances, EngineSnapshot, ErrorOverlay, Phase, RetryKind, StopReason};
pub use models::policy::{ResponsePolicy, TakeBudget};
pub use models::stimulus::{ReplayState, SlideConfig, SlideKey, StimulusVideo};
pub use models::take::{PlayableHandle, Take, TakeId, TakeSummary};
pub use probe::capability::{check_capability, Capability};
pub use storage::file_store::{FileResponseStore, StorageConfig};
pub use storage::memory_kv::MemoryKeyValueStore;
pub use traits::capture_backend::{
    AcquireOutcome, AcquireTicket, CaptureBackend, ChunkCallback, Environment, MediaStream,
};
pub use traits::encryptor::TakeEncryptor;
pub use traits::engine_delegate::EngineDelegate;
pub use traits::ports::{ContentProvider, KeyValueStore, NavigationHost, ResponseStore};
