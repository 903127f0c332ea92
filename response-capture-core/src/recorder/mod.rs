pub mod chunk_buffer;
pub mod controller;

pub use chunk_buffer::ChunkBuffer;
pub use controller::{ChunkObserver, Recorder, RecorderState};
