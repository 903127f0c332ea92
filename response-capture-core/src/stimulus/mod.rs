pub mod playback;
pub mod replay;
pub mod watched;

pub use playback::{PlaybackEnd, PlaybackState, StimulusPlayback};
pub use replay::ReplayPolicy;
