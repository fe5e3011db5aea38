//! Live camera viewer drawing object detection boxes over the video.

pub mod config;
pub mod detector;
pub mod headless;
pub mod orchestrator;
pub mod status;
pub mod tui;
pub mod viewer;
