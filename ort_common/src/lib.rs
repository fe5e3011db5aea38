//! ONNX Runtime backed detection models.

pub mod nms;
pub mod yolov8;

pub use yolov8::{YoloConfig, YoloV8};
