//! Model-agnostic building blocks shared by the capture, inference and viewer crates.

pub mod annotate;
pub mod bbox;
pub mod capture;
pub mod coco_classes;
pub mod detection;
pub mod frame;
pub mod frame_times;
pub mod img_dimensions;
pub mod model;
pub mod rate;
pub mod surface;
