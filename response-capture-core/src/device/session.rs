use crate::models::constraints::MediaConstraints;
use crate::models::error::CaptureError;
use crate::probe::capability::check_capability;
use crate::traits::capture_backend::{AcquireOutcome, AcquireTicket, CaptureBackend, MediaStream};

/// Where an acquisition stands after a request or a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireProgress {
    /// A live stream is held.
    Active,
    /// Waiting on a permission prompt.
    Pending,
    /// The resolution belonged to a cancelled or superseded request; any
    /// stream it carried has been stopped.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    ticket: AcquireTicket,
    fallback_used: bool,
}

/// The single camera + microphone acquisition of a slide instance.
///
/// Acquisition state transitions:
/// ```text
/// idle → pending → active
///   ↑        │        │
///   └──── release ────┘
/// ```
/// A request the backend rejects as over-constrained is retried exactly once
/// with the fallback constraints before the failure is surfaced.
pub struct CaptureDeviceSession {
    preferred: MediaConstraints,
    fallback: MediaConstraints,
    stream: Option<Box<dyn MediaStream>>,
    pending: Option<PendingRequest>,
    acquisitions: u64,
    releases: u64,
}

impl CaptureDeviceSession {
    pub fn new(preferred: MediaConstraints, fallback: MediaConstraints) -> Self {
        Self {
            preferred,
            fallback,
            stream: None,
            pending: None,
            acquisitions: 0,
            releases: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether the held stream's tracks are still running.
    pub fn is_live(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stream_mut(&mut self) -> Option<&mut Box<dyn MediaStream>> {
        self.stream.as_mut()
    }

    /// Streams granted over the lifetime of this session.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    /// Streams stopped over the lifetime of this session.
    pub fn releases(&self) -> u64 {
        self.releases
    }

    /// Request a stream, releasing whatever this session held before.
    pub fn acquire(&mut self, backend: &mut dyn CaptureBackend) -> Result<AcquireProgress, CaptureError> {
        check_capability(&backend.environment()).into_result()?;

        if self.stream.is_some() || self.pending.is_some() {
            log::debug!("Releasing previous capture session before re-acquiring");
            self.release(backend);
        }

        self.request(backend, false)
    }

    /// Complete a pending request.
    pub fn resolve(
        &mut self,
        backend: &mut dyn CaptureBackend,
        ticket: AcquireTicket,
        result: Result<Box<dyn MediaStream>, CaptureError>,
    ) -> Result<AcquireProgress, CaptureError> {
        let pending = match self.pending {
            Some(p) if p.ticket == ticket => p,
            _ => {
                log::warn!("Ignoring stale acquisition result for ticket {:?}", ticket);
                if let Ok(mut stream) = result {
                    stream.stop_tracks();
                }
                return Ok(AcquireProgress::Stale);
            }
        };
        self.pending = None;

        match result {
            Ok(stream) => Ok(self.hold(stream)),
            Err(e) => self.on_failure(backend, e, pending.fallback_used),
        }
    }

    /// Stop the held stream and cancel any pending request.
    ///
    /// Returns whether anything was released; calling it again is a no-op.
    pub fn release(&mut self, backend: &mut dyn CaptureBackend) -> bool {
        let mut released = false;

        if let Some(pending) = self.pending.take() {
            log::info!("Cancelling pending capture request {:?}", pending.ticket);
            backend.cancel_request(pending.ticket);
            released = true;
        }

        if let Some(mut stream) = self.stream.take() {
            log::info!("Releasing capture stream {}", stream.id());
            stream.stop_tracks();
            self.releases += 1;
            released = true;
        }

        released
    }

    fn request(
        &mut self,
        backend: &mut dyn CaptureBackend,
        fallback_used: bool,
    ) -> Result<AcquireProgress, CaptureError> {
        let constraints = if fallback_used { &self.fallback } else { &self.preferred };

        match backend.request_stream(constraints) {
            AcquireOutcome::Granted(stream) => Ok(self.hold(stream)),
            AcquireOutcome::Pending(ticket) => {
                log::info!("Waiting for capture permission ({:?})", ticket);
                self.pending = Some(PendingRequest { ticket, fallback_used });
                Ok(AcquireProgress::Pending)
            }
            AcquireOutcome::Failed(e) => self.on_failure(backend, e, fallback_used),
        }
    }

    fn on_failure(
        &mut self,
        backend: &mut dyn CaptureBackend,
        error: CaptureError,
        fallback_used: bool,
    ) -> Result<AcquireProgress, CaptureError> {
        match error {
            CaptureError::ConstraintsUnsatisfiable if !fallback_used => {
                log::info!("Preferred capture constraints rejected, retrying with fallback");
                self.request(backend, true)
            }
            CaptureError::ConstraintsUnsatisfiable => {
                log::error!("Fallback capture constraints rejected");
                Err(CaptureError::DeviceNotFound)
            }
            other => {
                log::error!("Capture acquisition failed: {}", other);
                Err(other)
            }
        }
    }

    fn hold(&mut self, stream: Box<dyn MediaStream>) -> AcquireProgress {
        log::info!("Acquired capture stream {}", stream.id());
        self.acquisitions += 1;
        self.stream = Some(stream);
        AcquireProgress::Active
    }
}
