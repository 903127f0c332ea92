use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::constraints::MediaConstraints;
use crate::models::error::CaptureError;

/// Callback invoked with each encoded media chunk, in capture order.
pub type ChunkCallback = Arc<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

/// What the runtime environment exposes for device access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// Served over a secure transport (HTTPS, localhost, native app).
    pub secure_context: bool,
    /// A camera/microphone acquisition API exists.
    pub has_device_api: bool,
    /// A media encoder/recorder API exists.
    pub has_recorder_api: bool,
}

impl Environment {
    pub fn fully_capable() -> Self {
        Self {
            secure_context: true,
            has_device_api: true,
            has_recorder_api: true,
        }
    }
}

/// Identifies an acquisition request still waiting on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcquireTicket(pub u64);

/// Immediate answer to a stream request.
pub enum AcquireOutcome {
    Granted(Box<dyn MediaStream>),
    /// A permission prompt is showing; the host resolves it later.
    Pending(AcquireTicket),
    Failed(CaptureError),
}

impl fmt::Debug for AcquireOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted(stream) => f.debug_tuple("Granted").field(&stream.id()).finish(),
            Self::Pending(ticket) => f.debug_tuple("Pending").field(ticket).finish(),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

/// Platform camera + microphone access.
///
/// Implemented by:
/// - `SimulatedCamera` (response-capture-sim)
/// - hosts wrapping a browser or native capture API
pub trait CaptureBackend: Send {
    /// Describe the environment for the capability probe.
    fn environment(&self) -> Environment;

    /// Ask for a live camera + microphone stream.
    fn request_stream(&mut self, constraints: &MediaConstraints) -> AcquireOutcome;

    /// Abandon a pending request. A stream delivered for it afterwards is
    /// stopped by the engine.
    fn cancel_request(&mut self, ticket: AcquireTicket);
}

/// One live camera + microphone acquisition.
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    /// Whether the device tracks are still running.
    fn is_live(&self) -> bool;

    /// Start encoding, delivering a chunk roughly every `timeslice`.
    fn start_encoding(&mut self, timeslice: Duration, callback: ChunkCallback) -> Result<(), CaptureError>;

    fn pause_encoding(&mut self);

    fn resume_encoding(&mut self);

    /// Stop the encoder. Every pending chunk must be delivered through the
    /// callback before this returns.
    fn stop_encoding(&mut self);

    /// Stop all device tracks. Calling it again is a no-op.
    fn stop_tracks(&mut self);
}
