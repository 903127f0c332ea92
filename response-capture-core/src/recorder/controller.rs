use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::take::FinalizedMedia;
use crate::recorder::chunk_buffer::ChunkBuffer;
use crate::traits::capture_backend::{ChunkCallback, MediaStream};

/// Observer called after each accepted chunk with `(chunk_len, chunks_so_far)`.
pub type ChunkObserver = Arc<dyn Fn(usize, usize) + Send + Sync + 'static>;

/// Recorder state machine.
///
/// ```text
/// recording ↔ paused
///     ↓         ↓
///     finalized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Recording,
    Paused,
    Finalized,
}

/// One recording pass against a live stream.
///
/// The stream itself stays owned by the capture device session; every call
/// that touches the encoder borrows it. A recorder yields at most one take.
pub struct Recorder {
    buffer: Arc<Mutex<ChunkBuffer>>,
    state: RecorderState,
    tick_interval: Duration,
    active_ticks: u32,
    segment_start: Option<Instant>,
}

impl Recorder {
    /// Start encoding on `stream`; chunks arrive every `tick_interval`.
    pub fn begin(
        stream: &mut dyn MediaStream,
        tick_interval: Duration,
        on_chunk: Option<ChunkObserver>,
    ) -> Result<Self, CaptureError> {
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));

        let sink = Arc::clone(&buffer);
        let callback: ChunkCallback = Arc::new(move |chunk: Vec<u8>| {
            let len = chunk.len();
            let accepted = {
                let mut buf = sink.lock();
                buf.push(chunk).then(|| buf.count())
            };
            if let (Some(count), Some(observer)) = (accepted, on_chunk.as_ref()) {
                observer(len, count);
            }
        });

        stream.start_encoding(tick_interval, callback)?;
        log::info!("Recording started on stream {}", stream.id());

        Ok(Self {
            buffer,
            state: RecorderState::Recording,
            tick_interval,
            active_ticks: 0,
            segment_start: Some(Instant::now()),
        })
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == RecorderState::Paused
    }

    pub fn chunk_count(&self) -> usize {
        self.buffer.lock().count()
    }

    /// Pause. Transitions: recording → paused.
    pub fn pause(&mut self, stream: &mut dyn MediaStream) -> Result<(), CaptureError> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("pause"));
        }
        stream.pause_encoding();
        self.segment_start = None;
        self.state = RecorderState::Paused;
        Ok(())
    }

    /// Resume. Transitions: paused → recording.
    pub fn resume(&mut self, stream: &mut dyn MediaStream) -> Result<(), CaptureError> {
        if self.state != RecorderState::Paused {
            return Err(self.invalid("resume"));
        }
        stream.resume_encoding();
        self.segment_start = Some(Instant::now());
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Count one elapsed tick if recording. Returns the ticked seconds.
    pub fn on_tick(&mut self) -> f64 {
        if self.state == RecorderState::Recording {
            self.active_ticks += 1;
            self.segment_start = Some(Instant::now());
        }
        self.ticked_secs()
    }

    /// Whole ticks of active recording, in seconds.
    pub fn ticked_secs(&self) -> f64 {
        self.active_ticks as f64 * self.tick_interval.as_secs_f64()
    }

    /// Active recording time including the part of the current tick.
    pub fn elapsed_secs(&self) -> f64 {
        let partial = match (self.state, self.segment_start) {
            (RecorderState::Recording, Some(start)) => start.elapsed().min(self.tick_interval),
            _ => Duration::ZERO,
        };
        self.ticked_secs() + partial.as_secs_f64()
    }

    /// Finalize. Transitions: recording/paused → finalized.
    ///
    /// The encoder flushes its trailing chunk before the buffer is sealed.
    pub fn stop(&mut self, stream: &mut dyn MediaStream) -> Result<FinalizedMedia, CaptureError> {
        if self.state == RecorderState::Finalized {
            return Err(self.invalid("stop"));
        }

        let duration_secs = self.elapsed_secs();
        stream.stop_encoding();
        self.state = RecorderState::Finalized;

        let (bytes, chunk_count) = {
            let mut buf = self.buffer.lock();
            let count = buf.count();
            (buf.seal(), count)
        };

        if chunk_count == 0 || bytes.is_empty() {
            log::warn!("Recording on stream {} produced no data", stream.id());
            return Err(CaptureError::NoDataCaptured);
        }

        log::info!(
            "Recording finalized: {} chunks, {} bytes, {:.1}s",
            chunk_count,
            bytes.len(),
            duration_secs
        );
        Ok(FinalizedMedia {
            bytes,
            duration_secs,
            chunk_count,
        })
    }

    /// Stop without producing a take. Safe to call in any state.
    pub fn abort(&mut self, stream: Option<&mut dyn MediaStream>) {
        if self.state == RecorderState::Finalized {
            return;
        }
        if let Some(stream) = stream {
            stream.stop_encoding();
        }
        self.buffer.lock().discard();
        self.state = RecorderState::Finalized;
        log::info!("Recording aborted");
    }

    fn invalid(&self, action: &str) -> CaptureError {
        CaptureError::InvalidTransition {
            phase: format!("recorder {:?}", self.state).to_lowercase(),
            action: action.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStream;

    const TICK: Duration = Duration::from_secs(1);

    #[test]
    fn stop_concatenates_chunks_and_trailing_flush() {
        let (mut stream, probe) = FakeStream::new("cam", Some(vec![9]));
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();

        probe.emit(&[1, 2]);
        probe.emit(&[3]);
        rec.on_tick();
        rec.on_tick();

        let media = rec.stop(&mut stream).unwrap();
        assert_eq!(media.bytes, vec![1, 2, 3, 9]);
        assert_eq!(media.chunk_count, 3);
        assert!(media.duration_secs >= 2.0);
        assert!(!probe.is_encoding());
    }

    #[test]
    fn stop_without_chunks_is_no_data_captured() {
        let (mut stream, _probe) = FakeStream::new("cam", None);
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();
        rec.on_tick();

        assert_eq!(rec.stop(&mut stream).unwrap_err(), CaptureError::NoDataCaptured);
        assert_eq!(rec.state(), RecorderState::Finalized);
    }

    #[test]
    fn chunks_after_finalization_are_dropped() {
        let (mut stream, probe) = FakeStream::new("cam", None);
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();
        probe.emit(&[1]);
        rec.stop(&mut stream).unwrap();

        probe.emit(&[2]);
        assert_eq!(rec.chunk_count(), 0);
        assert_eq!(rec.buffer.lock().rejected(), 1);
    }

    #[test]
    fn paused_ticks_do_not_count() {
        let (mut stream, probe) = FakeStream::new("cam", None);
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();

        rec.on_tick();
        rec.pause(&mut stream).unwrap();
        assert!(probe.is_paused());
        rec.on_tick();
        rec.on_tick();
        rec.resume(&mut stream).unwrap();
        rec.on_tick();

        approx::assert_abs_diff_eq!(rec.ticked_secs(), 2.0);
    }

    #[test]
    fn invalid_pause_resume_and_double_stop() {
        let (mut stream, probe) = FakeStream::new("cam", None);
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();

        assert!(rec.resume(&mut stream).is_err());
        rec.pause(&mut stream).unwrap();
        assert!(rec.pause(&mut stream).is_err());

        probe.emit(&[7]);
        rec.stop(&mut stream).unwrap();
        assert!(matches!(
            rec.stop(&mut stream),
            Err(CaptureError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn observer_sees_each_accepted_chunk() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: ChunkObserver = Arc::new(move |len, count| sink.lock().push((len, count)));

        let (mut stream, probe) = FakeStream::new("cam", None);
        let _rec = Recorder::begin(&mut stream, TICK, Some(observer)).unwrap();
        probe.emit(&[1, 2, 3]);
        probe.emit(&[]);
        probe.emit(&[4]);

        assert_eq!(*seen.lock(), vec![(3, 1), (1, 2)]);
    }

    #[test]
    fn abort_discards_and_stops_encoder() {
        let (mut stream, probe) = FakeStream::new("cam", Some(vec![1]));
        let mut rec = Recorder::begin(&mut stream, TICK, None).unwrap();
        probe.emit(&[5]);

        rec.abort(Some(&mut stream));
        assert_eq!(rec.state(), RecorderState::Finalized);
        assert!(!probe.is_encoding());
        assert_eq!(rec.chunk_count(), 0);
    }
}
