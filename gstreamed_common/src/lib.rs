//! GStreamer plumbing: live camera capture and the preview window.

pub mod display;
pub mod pipeline;
pub mod webcam;

pub use display::GstDisplay;
pub use pipeline::VideoInput;
pub use webcam::{GstCamera, GstCaptureStream};
