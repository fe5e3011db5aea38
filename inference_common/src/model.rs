use std::path::PathBuf;

use thiserror::Error;

use crate::detection::Detection;
use crate::frame::Frame;

/// Descriptive information about a loaded model, shown in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub architecture: String,
    pub framework: String,
    pub dataset: String,
}

/// The pretrained model failed to initialize. Not retried.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model weights not found at {0:?}")]
    Missing(PathBuf),
    #[error("failed to initialize model runtime: {0}")]
    Runtime(String),
    #[error("model output does not match the expected layout: {0}")]
    Layout(String),
    #[error("model loader aborted: {0}")]
    Aborted(String),
}

/// Black-box object detector.
///
/// Implementations run synchronously; callers that must not block are
/// expected to move the call onto a blocking thread.
pub trait DetectionModel: Send + 'static {
    fn info(&self) -> ModelInfo;

    /// Detects objects in `frame`. Boxes are in frame pixel coordinates.
    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>>;
}

impl<M: DetectionModel + ?Sized> DetectionModel for Box<M> {
    fn info(&self) -> ModelInfo {
        (**self).info()
    }

    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        (**self).infer(frame)
    }
}
