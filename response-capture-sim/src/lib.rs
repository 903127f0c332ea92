//! # response-capture-sim
//!
//! Simulated platform pieces for response-capture-core.
//!
//! Provides:
//! - `SimulatedCamera` — scriptable camera + microphone backend with a
//!   threaded synthetic encoder
//! - `Metronome` — fixed-interval tick thread for the engine clock
//! - `JsonContentProvider` — slide configs from JSON documents
//! - `AesGcmTakeEncryptor` — AES-256-GCM sealing for stored takes
//!
//! ## Usage
//! ```ignore
//! use response_capture_sim::{Behaviour, SimulatedCamera};
//!
//! let (camera, control) = SimulatedCamera::new();
//! control.push(Behaviour::Prompt);
//! ```

pub mod aes_encryptor;
pub mod json_content;
pub mod metronome;
pub mod simulated_camera;

pub use aes_encryptor::AesGcmTakeEncryptor;
pub use json_content::JsonContentProvider;
pub use metronome::Metronome;
pub use simulated_camera::{Behaviour, CameraControl, SimulatedCamera, SimulatedStream};
