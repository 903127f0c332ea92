use crate::models::stimulus::{ReplayState, StimulusVideo};

/// How many times a stimulus may be watched.
///
/// The first view is always free; each further full playback consumes one
/// of `max_replays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPolicy {
    pub allow_replay: bool,
    pub max_replays: u32,
}

impl ReplayPolicy {
    /// Highest view count a slide instance can reach.
    pub fn view_cap(&self) -> u32 {
        self.max_replays.saturating_add(1)
    }

    pub fn can_play(&self, state: &ReplayState) -> bool {
        if state.view_count >= 1 && (!self.allow_replay || self.max_replays == 0) {
            return false;
        }
        state.view_count < self.view_cap()
    }

    /// Count one playback that reached its natural end.
    pub fn on_playback_completed(&self, state: ReplayState) -> ReplayState {
        ReplayState {
            view_count: state.view_count.saturating_add(1).min(self.view_cap()),
        }
    }

    /// Clamp a persisted state that predates a policy change.
    pub fn clamp(&self, state: ReplayState) -> ReplayState {
        ReplayState {
            view_count: state.view_count.min(self.view_cap()),
        }
    }

    /// Plays left, including the first one.
    pub fn remaining_plays(&self, state: &ReplayState) -> u32 {
        if !self.can_play(state) {
            return 0;
        }
        if self.allow_replay {
            self.view_cap() - state.view_count
        } else {
            1
        }
    }
}

impl From<&StimulusVideo> for ReplayPolicy {
    fn from(stimulus: &StimulusVideo) -> Self {
        Self {
            allow_replay: stimulus.allow_replay,
            max_replays: stimulus.max_replays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(view_count: u32) -> ReplayState {
        ReplayState { view_count }
    }

    #[test]
    fn one_replay_allows_two_views() {
        let policy = ReplayPolicy { allow_replay: true, max_replays: 1 };
        let s0 = state(0);
        assert!(policy.can_play(&s0));

        let s1 = policy.on_playback_completed(s0);
        assert_eq!(s1.view_count, 1);
        assert!(policy.can_play(&s1));

        let s2 = policy.on_playback_completed(s1);
        assert_eq!(s2.view_count, 2);
        assert!(!policy.can_play(&s2));
    }

    #[test]
    fn first_view_is_always_free() {
        for (allow_replay, max_replays) in [(false, 0), (false, 3), (true, 0)] {
            let policy = ReplayPolicy { allow_replay, max_replays };
            assert!(policy.can_play(&state(0)));
            assert!(!policy.can_play(&state(1)));
        }
    }

    #[test]
    fn view_count_is_capped() {
        let policy = ReplayPolicy { allow_replay: true, max_replays: 2 };
        for completions in 0..10u32 {
            let mut s = state(0);
            for _ in 0..completions {
                s = policy.on_playback_completed(s);
            }
            assert_eq!(s.view_count, completions.min(3));
            assert_eq!(policy.can_play(&s), completions < 3);
        }
    }

    #[test]
    fn remaining_plays() {
        let policy = ReplayPolicy { allow_replay: true, max_replays: 2 };
        assert_eq!(policy.remaining_plays(&state(0)), 3);
        assert_eq!(policy.remaining_plays(&state(2)), 1);
        assert_eq!(policy.remaining_plays(&state(3)), 0);

        let once = ReplayPolicy { allow_replay: false, max_replays: 5 };
        assert_eq!(once.remaining_plays(&state(0)), 1);
    }

    #[test]
    fn clamp_limits_persisted_state() {
        let policy = ReplayPolicy { allow_replay: true, max_replays: 1 };
        assert_eq!(policy.clamp(state(9)).view_count, 2);
    }
}
