use inference_common::detection::Detection;
use inference_common::img_dimensions::ImgDimensions;
use inference_common::model::ModelInfo;

/// Capture lifecycle of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No camera held, overlay empty.
    #[default]
    Idle,
    /// Camera acquisition in flight.
    Requesting,
    /// Capture-detect-render cycles are running.
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Snapshot of everything the dashboard shows, published after each change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerStatus {
    pub state: LoopState,
    pub model: ModelStatus,
    pub model_info: Option<ModelInfo>,
    pub fps: u32,
    /// Highest-confidence detections of the last frame, best first.
    pub top: Vec<Detection>,
    /// Detections in the last frame, including those not in `top`.
    pub total: usize,
    pub frame_dims: Option<ImgDimensions>,
    /// Why the camera could not be used; cleared on the next start.
    pub capture_error: Option<String>,
}
