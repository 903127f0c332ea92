pub mod session;

pub use session::{AcquireProgress, CaptureDeviceSession};
