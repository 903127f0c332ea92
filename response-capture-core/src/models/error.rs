use thiserror::Error;

use super::phase::RetryKind;

/// Errors that can occur while driving a response capture.
///
/// Device errors come from the capture backend, the rest are raised by the
/// engine itself or by the external ports it calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("no capture device found")]
    DeviceNotFound,

    #[error("capture device is busy")]
    DeviceBusy,

    #[error("requested capture constraints cannot be satisfied")]
    ConstraintsUnsatisfiable,

    #[error("capture is not possible in this environment: {0}")]
    InsecureContext(String),

    #[error("no data captured")]
    NoDataCaptured,

    #[error("failed to load stimulus: {0}")]
    StimulusLoadFailure(String),

    #[error("failed to submit response: {0}")]
    SubmissionFailure(String),

    #[error("action `{action}` is not allowed in phase {phase}")]
    InvalidTransition { phase: String, action: String },

    #[error("no capacity left for another take")]
    CapacityExhausted,

    #[error("stimulus replay is not allowed")]
    ReplayNotAllowed,

    #[error("no take selected")]
    NoTakeSelected,

    #[error("unknown take: {0}")]
    UnknownTake(u64),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("slide instance has been torn down")]
    TornDown,
}

impl CaptureError {
    /// Errors raised while acquiring or using camera/microphone hardware.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::DeviceNotFound
                | Self::DeviceBusy
                | Self::ConstraintsUnsatisfiable
                | Self::InsecureContext(_)
        )
    }

    /// Which retry affordance the UI should offer for this error, if any.
    pub fn retry_kind(&self) -> Option<RetryKind> {
        match self {
            e if e.is_device_error() => Some(RetryKind::Capture),
            Self::NoDataCaptured => Some(RetryKind::Capture),
            Self::StimulusLoadFailure(_) => Some(RetryKind::StimulusLoad),
            Self::SubmissionFailure(_) => Some(RetryKind::Submit),
            _ => None,
        }
    }
}
