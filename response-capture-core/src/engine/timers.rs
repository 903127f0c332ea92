/// Pending tick-driven timers of a slide instance.
///
/// The host delivers one tick per interval; these timers only count them.
#[derive(Debug, Default)]
pub struct TimerSet {
    countdown: Option<u32>,
    recording_limit: Option<f64>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_countdown(&mut self, ticks: u32) {
        self.countdown = Some(ticks);
    }

    /// Count one countdown tick. Returns the remaining ticks, or `None` when
    /// no countdown is armed.
    pub fn tick_countdown(&mut self) -> Option<u32> {
        let remaining = self.countdown.as_mut()?;
        *remaining = remaining.saturating_sub(1);
        Some(*remaining)
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown
    }

    pub fn disarm_countdown(&mut self) {
        self.countdown = None;
    }

    pub fn arm_recording_limit(&mut self, limit_secs: f64) {
        self.recording_limit = Some(limit_secs);
    }

    pub fn recording_limit(&self) -> Option<f64> {
        self.recording_limit
    }

    /// Whether `elapsed_secs` has reached the armed recording limit.
    pub fn limit_reached(&self, elapsed_secs: f64) -> bool {
        self.recording_limit
            .is_some_and(|limit| elapsed_secs + 1e-9 >= limit)
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.is_some() || self.recording_limit.is_some()
    }

    /// Disarm everything. Returns whether anything was armed.
    pub fn clear(&mut self) -> bool {
        let was_armed = self.is_armed();
        self.countdown = None;
        self.recording_limit = None;
        was_armed
    }
}
