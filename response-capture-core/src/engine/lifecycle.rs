use std::time::Duration;

use crate::device::session::{AcquireProgress, CaptureDeviceSession};
use crate::engine::timers::TimerSet;
use crate::models::constraints::MediaConstraints;
use crate::models::error::CaptureError;
use crate::models::take::FinalizedMedia;
use crate::recorder::controller::{ChunkObserver, Recorder};
use crate::takes::repository::TakeRepository;
use crate::traits::capture_backend::{AcquireTicket, CaptureBackend, MediaStream};

/// What a teardown actually released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub recorder_stopped: bool,
    pub device_released: bool,
    pub timers_cleared: bool,
    pub takes_disposed: usize,
}

/// Owner of every releasable resource of a slide instance: the capture
/// session, the active recorder and the pending timers.
///
/// All hardware release goes through this type. `release_capture` ends a
/// capture pass; `teardown` additionally disposes the takes and closes the
/// scope for good. Both are idempotent.
pub struct ResourceScope {
    device: CaptureDeviceSession,
    recorder: Option<Recorder>,
    timers: TimerSet,
    torn_down: bool,
}

impl ResourceScope {
    pub fn new(preferred: MediaConstraints, fallback: MediaConstraints) -> Self {
        Self {
            device: CaptureDeviceSession::new(preferred, fallback),
            recorder: None,
            timers: TimerSet::new(),
            torn_down: false,
        }
    }

    pub fn device(&self) -> &CaptureDeviceSession {
        &self.device
    }

    pub fn recorder(&self) -> Option<&Recorder> {
        self.recorder.as_ref()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerSet {
        &mut self.timers
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Acquire the capture device, ending any previous capture pass first.
    pub fn acquire(&mut self, backend: &mut dyn CaptureBackend) -> Result<AcquireProgress, CaptureError> {
        if self.torn_down {
            return Err(CaptureError::TornDown);
        }
        self.abort_recorder();
        self.device.acquire(backend)
    }

    pub fn resolve(
        &mut self,
        backend: &mut dyn CaptureBackend,
        ticket: AcquireTicket,
        result: Result<Box<dyn MediaStream>, CaptureError>,
    ) -> Result<AcquireProgress, CaptureError> {
        if self.torn_down {
            if let Ok(mut stream) = result {
                log::warn!("Stopping stream {} granted after teardown", stream.id());
                stream.stop_tracks();
            }
            return Ok(AcquireProgress::Stale);
        }
        self.device.resolve(backend, ticket, result)
    }

    /// Start a recorder on the held stream. Only one recorder may exist.
    pub fn start_recorder(
        &mut self,
        tick_interval: Duration,
        on_chunk: Option<ChunkObserver>,
    ) -> Result<(), CaptureError> {
        if self.recorder.is_some() {
            return Err(CaptureError::InvalidTransition {
                phase: "recording".into(),
                action: "start a second recorder".into(),
            });
        }
        let stream = self.device.stream_mut().ok_or(CaptureError::DeviceNotFound)?;
        self.recorder = Some(Recorder::begin(&mut **stream, tick_interval, on_chunk)?);
        Ok(())
    }

    pub fn pause_recorder(&mut self) -> Result<(), CaptureError> {
        let (recorder, stream) = self.recorder_and_stream()?;
        recorder.pause(&mut **stream)
    }

    pub fn resume_recorder(&mut self) -> Result<(), CaptureError> {
        let (recorder, stream) = self.recorder_and_stream()?;
        recorder.resume(&mut **stream)
    }

    /// Count a tick on the active recorder. Returns whole ticked seconds.
    pub fn tick_recorder(&mut self) -> Option<f64> {
        self.recorder.as_mut().map(Recorder::on_tick)
    }

    /// Finalize the active recorder, then end the capture pass.
    pub fn finish_recording(&mut self, backend: &mut dyn CaptureBackend) -> Result<FinalizedMedia, CaptureError> {
        let result = match (self.recorder.as_mut(), self.device.stream_mut()) {
            (Some(recorder), Some(stream)) => recorder.stop(&mut **stream),
            _ => Err(CaptureError::InvalidTransition {
                phase: "recording".into(),
                action: "stop without an active recorder".into(),
            }),
        };
        self.recorder = None;
        self.release_capture(backend);
        result
    }

    /// End the current capture pass: abort the recorder, release the device,
    /// clear timers. Returns whether anything was released.
    pub fn release_capture(&mut self, backend: &mut dyn CaptureBackend) -> bool {
        let recorder_stopped = self.abort_recorder();
        let device_released = self.device.release(backend);
        let timers_cleared = self.timers.clear();
        recorder_stopped || device_released || timers_cleared
    }

    /// Release everything the slide instance holds, takes included.
    ///
    /// Returns `None` when the scope was already torn down.
    pub fn teardown(
        &mut self,
        backend: &mut dyn CaptureBackend,
        takes: &mut TakeRepository,
    ) -> Option<TeardownReport> {
        if self.torn_down {
            log::debug!("Teardown already done");
            return None;
        }
        self.torn_down = true;

        let report = TeardownReport {
            recorder_stopped: self.abort_recorder(),
            device_released: self.device.release(backend),
            timers_cleared: self.timers.clear(),
            takes_disposed: takes.dispose_all(),
        };
        log::info!("Teardown complete: {:?}", report);
        Some(report)
    }

    fn abort_recorder(&mut self) -> bool {
        let Some(mut recorder) = self.recorder.take() else {
            return false;
        };
        match self.device.stream_mut() {
            Some(stream) => recorder.abort(Some(&mut **stream)),
            None => recorder.abort(None),
        }
        true
    }

    fn recorder_and_stream(&mut self) -> Result<(&mut Recorder, &mut Box<dyn MediaStream>), CaptureError> {
        match (self.recorder.as_mut(), self.device.stream_mut()) {
            (Some(recorder), Some(stream)) => Ok((recorder, stream)),
            _ => Err(CaptureError::InvalidTransition {
                phase: "recording".into(),
                action: "control a recorder that is not running".into(),
            }),
        }
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        // Without a backend a pending request cannot be cancelled, but a held
        // stream can still be stopped.
        self.abort_recorder();
        if let Some(stream) = self.device.stream_mut() {
            stream.stop_tracks();
        }
    }
}
