//! Fixed-interval tick source for driving countdown and recording clocks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use response_capture_core::models::error::CaptureError;

/// Calls `on_tick` once per interval on a dedicated thread until stopped.
///
/// Each deadline is the previous one plus the interval, so ticks do not drift when a
/// callback runs long.
pub struct Metronome {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Metronome {
    pub fn start<F>(interval: Duration, on_tick: F) -> Result<Self, CaptureError>
    where
        F: Fn(u64) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CaptureError::ConfigurationFailed("tick interval must be positive".into()));
        }

        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let thread_running = Arc::clone(&running);
        let thread_ticks = Arc::clone(&ticks);

        let handle = thread::Builder::new()
            .name("metronome".into())
            .spawn(move || {
                let poll = Duration::from_millis(5).min(interval);
                let mut due = Instant::now().checked_add(interval);
                while thread_running.load(Ordering::SeqCst) {
                    let Some(deadline) = due else {
                        log::warn!("Metronome clock overflowed, stopping");
                        break;
                    };
                    let wait = deadline.saturating_duration_since(Instant::now());
                    if !wait.is_zero() {
                        thread::sleep(poll.min(wait));
                        continue;
                    }
                    let next = thread_ticks.fetch_add(1, Ordering::SeqCst) + 1;
                    on_tick(next);
                    due = deadline.checked_add(interval);
                }
            })
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to spawn metronome thread: {}", e)))?;

        log::debug!("Metronome started at {:?}", interval);
        Ok(Self {
            running,
            ticks,
            handle: Some(handle),
        })
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop and join the tick thread. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("Metronome stopped after {} ticks", self.ticks());
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn ticks_are_numbered_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut metronome = Metronome::start(Duration::from_millis(10), move |n| {
            let _ = tx.send(n);
        })
        .unwrap();

        let first: Vec<u64> = rx.iter().take(3).collect();
        metronome.stop();
        assert_eq!(first, vec![1, 2, 3]);
        assert!(!metronome.is_running());
        assert!(metronome.ticks() >= 3);
    }

    #[test]
    fn no_ticks_after_stop() {
        let (tx, rx) = mpsc::channel();
        let mut metronome = Metronome::start(Duration::from_millis(10), move |n| {
            let _ = tx.send(n);
        })
        .unwrap();
        rx.recv().unwrap();
        metronome.stop();
        metronome.stop();

        let seen = metronome.ticks();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(metronome.ticks(), seen);
    }

    #[test]
    fn deadlines_accumulate_without_skipping_ticks() {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let mut metronome = Metronome::start(Duration::from_millis(5), move |n| {
            let _ = tx.send(n);
        })
        .unwrap();

        let ticks: Vec<u64> = rx.iter().take(20).collect();
        metronome.stop();
        assert_eq!(ticks, (1..=20).collect::<Vec<u64>>());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn zero_interval_is_refused() {
        assert!(matches!(
            Metronome::start(Duration::ZERO, |_| {}),
            Err(CaptureError::ConfigurationFailed(_))
        ));
    }
}
