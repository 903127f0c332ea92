/// Which camera to prefer on devices that have more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Video part of a capture request. `None` fields mean "anything".
#[derive(Debug, Clone, PartialEq)]
pub struct VideoConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub facing_mode: Option<FacingMode>,
}

/// A camera + microphone request handed to the capture backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConstraints {
    pub video: VideoConstraints,
    pub audio: bool,
}

impl MediaConstraints {
    /// 720p at 30 fps from the user-facing camera, with audio.
    pub fn preferred() -> Self {
        Self {
            video: VideoConstraints {
                width: Some(1280),
                height: Some(720),
                frame_rate: Some(30.0),
                facing_mode: Some(FacingMode::User),
            },
            audio: true,
        }
    }

    /// Any camera, any microphone.
    pub fn minimal() -> Self {
        Self {
            video: VideoConstraints {
                width: None,
                height: None,
                frame_rate: None,
                facing_mode: None,
            },
            audio: true,
        }
    }

    pub fn is_minimal(&self) -> bool {
        self.video.width.is_none()
            && self.video.height.is_none()
            && self.video.frame_rate.is_none()
            && self.video.facing_mode.is_none()
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::preferred()
    }
}
