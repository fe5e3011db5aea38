use std::path::PathBuf;

use gstreamed_common::VideoInput;
use inference_common::capture::CaptureConstraints;
use ort_common::YoloConfig;

use crate::orchestrator::LoopConfig;

/// Device opened for the `webcam` input.
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Everything needed to assemble a viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub input: VideoInput,
    pub constraints: CaptureConstraints,
    pub yolo: YoloConfig,
    pub looping: LoopConfig,
    /// Font for overlay label text. Boxes are drawn without it.
    pub font: Option<PathBuf>,
    /// Show frames with overlay in a preview window.
    pub live: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            input: VideoInput::Device(DEFAULT_DEVICE.to_string()),
            constraints: CaptureConstraints::default(),
            yolo: YoloConfig::default(),
            looping: LoopConfig::default(),
            font: None,
            live: false,
        }
    }
}
