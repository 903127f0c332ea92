//! Camera/microphone capability check.
//!
//! Device access needs a secure transport and both the acquisition and the
//! recorder APIs. The probe only inspects the environment; it never prompts.

use crate::models::error::CaptureError;
use crate::traits::capture_backend::Environment;

/// Result of probing the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub securable: bool,
    pub reason: Option<String>,
}

impl Capability {
    /// Convert a refusal into the error surfaced to the user.
    pub fn into_result(self) -> Result<(), CaptureError> {
        if self.securable {
            Ok(())
        } else {
            Err(CaptureError::InsecureContext(
                self.reason.unwrap_or_else(|| "capture unavailable".into()),
            ))
        }
    }
}

/// Check whether the environment can grant camera/microphone access.
pub fn check_capability(env: &Environment) -> Capability {
    let reason = if !env.secure_context {
        Some("camera and microphone require a secure (HTTPS) connection")
    } else if !env.has_device_api {
        Some("this environment has no camera/microphone API")
    } else if !env.has_recorder_api {
        Some("this environment cannot record media")
    } else {
        None
    };

    Capability {
        securable: reason.is_none(),
        reason: reason.map(str::to_string),
    }
}
