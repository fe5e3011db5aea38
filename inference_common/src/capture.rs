//! Boundary between the viewer loop and a live camera.

use thiserror::Error;

use crate::frame::Frame;
use crate::img_dimensions::ImgDimensions;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    User,
    Environment,
}

/// Preferences used when acquiring a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Ideal frame size; devices may deliver something else.
    pub ideal: ImgDimensions,
    pub facing: Facing,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal: ImgDimensions::new(640, 480),
            facing: Facing::User,
        }
    }
}

/// The camera could not be acquired or stopped delivering frames.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureAccessError {
    #[error("no camera device available: {0}")]
    NoDevice(String),
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("camera could not be started: {0}")]
    Start(String),
    #[error("camera stream ended: {0}")]
    Ended(String),
}

/// A source of live camera streams.
pub trait CaptureDevice {
    type Stream: CaptureStream;

    /// Acquires the camera and starts streaming.
    fn open(&mut self, constraints: &CaptureConstraints) -> Result<Self::Stream, CaptureAccessError>;
}

/// A running camera stream.
pub trait CaptureStream {
    /// Newest frame delivered since the previous call, if any.
    fn latest_frame(&mut self) -> Option<Frame>;

    /// Errors once the stream has ended or failed.
    fn status(&mut self) -> Result<(), CaptureAccessError>;

    /// Releases the device. Calling it again has no effect.
    fn stop(&mut self);
}
