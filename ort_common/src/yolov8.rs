//! YOLOv8 object detection through ONNX Runtime.

use std::path::PathBuf;

use anyhow::{Context, bail};
use fast_image_resize as fr;
use inference_common::bbox::Bbox;
use inference_common::coco_classes;
use inference_common::detection::Detection;
use inference_common::frame::Frame;
use inference_common::img_dimensions::ImgDimensions;
use inference_common::model::{DetectionModel, ModelInfo, ModelLoadError};
use ndarray::{Array4, CowArray};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::TensorRef;

use crate::nms::{Candidate, nms};

#[derive(Debug, Clone)]
pub struct YoloConfig {
    /// YOLOv8 onnx export to load.
    pub model_path: PathBuf,
    /// Attempt CUDA acceleration. May silently fall back to cpu.
    pub cuda: bool,
    /// Square model input size.
    pub input_size: u32,
    pub conf_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("_models/yolov8s.onnx"),
            cuda: false,
            input_size: 640,
            conf_threshold: 0.5,
            nms_threshold: 0.45,
        }
    }
}

/// Parameters for turning raw model output into frame-space proposals.
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    pub input_size: u32,
    pub frame: ImgDimensions,
    pub conf_threshold: f32,
}

/// Decodes a `[1, 4 + classes, proposals]` YOLOv8 output.
///
/// Each proposal is `(cx, cy, w, h, class scores...)` in model input pixels,
/// stored one attribute row after the other. Proposals whose best class
/// score is below the threshold are dropped; the rest are scaled to frame
/// pixels and clamped to the frame.
pub fn decode_proposals(
    data: &[f32],
    num_attrs: usize,
    num_proposals: usize,
    params: &DecodeParams,
) -> anyhow::Result<Vec<Candidate>> {
    if num_attrs <= 4 {
        bail!("expected box coordinates plus class scores, got {num_attrs} attributes");
    }
    if data.len() < num_attrs * num_proposals {
        bail!(
            "output has {} values, expected {num_attrs}x{num_proposals}",
            data.len()
        );
    }

    let num_classes = num_attrs - 4;
    let frame_w = params.frame.width as f32;
    let frame_h = params.frame.height as f32;
    let scale_x = frame_w / params.input_size as f32;
    let scale_y = frame_h / params.input_size as f32;

    let mut candidates = Vec::new();
    for i in 0..num_proposals {
        let attr = |row: usize| data[row * num_proposals + i];

        let (class_idx, confidence) = (0..num_classes)
            .map(|c| (c, attr(4 + c)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if confidence < params.conf_threshold {
            continue;
        }

        let bbox = Bbox::from_center(attr(0), attr(1), attr(2), attr(3))
            .scale(scale_x, scale_y)
            .clamp_to(frame_w, frame_h);
        if !bbox.is_finite() {
            log::debug!("Skipping proposal {i} with non-finite box {bbox:?}");
            continue;
        }
        candidates.push(Candidate {
            class_idx,
            confidence,
            bbox,
        });
    }
    Ok(candidates)
}

fn build_session(config: &YoloConfig) -> anyhow::Result<Session> {
    let (ep, ep_name) = if config.cuda {
        (CUDAExecutionProvider::default().build(), "cuda")
    } else {
        (CPUExecutionProvider::default().build(), "cpu")
    };
    ort::init().with_execution_providers([ep]).commit()?;

    let session = SessionBuilder::new()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(&config.model_path)?;
    log::debug!("{session:?}");

    log::info!(
        "Prepared ort {ep_name} session with model: {:?}",
        config.model_path
    );
    Ok(session)
}

/// Pretrained YOLOv8 detector over the 80 COCO classes.
pub struct YoloV8 {
    session: Session,
    config: YoloConfig,
    resizer: fr::Resizer,
}

impl YoloV8 {
    /// Loads the model and runs one warm-up inference on a blank frame.
    pub fn load(config: YoloConfig) -> Result<Self, ModelLoadError> {
        if !config.model_path.exists() {
            return Err(ModelLoadError::Missing(config.model_path.clone()));
        }

        let session =
            build_session(&config).map_err(|e| ModelLoadError::Runtime(format!("{e:#}")))?;
        let mut model = Self {
            session,
            config,
            resizer: fr::Resizer::new(),
        };

        // First run does all kinds of lazy init; do it before the camera starts.
        let size = model.config.input_size;
        let blank = Frame::from_rgb(size, size, vec![0; (size * size * 3) as usize])
            .ok_or_else(|| ModelLoadError::Layout("invalid model input size".to_string()))?;
        model
            .infer(&blank)
            .map_err(|e| ModelLoadError::Layout(format!("{e:#}")))?;
        log::info!(
            "Detection thresholds: confidence={:.2}, nms={:.2}",
            model.config.conf_threshold,
            model.config.nms_threshold
        );

        Ok(model)
    }

    /// Resizes the frame to the model input and converts it to a NCHW tensor in `[0, 1]`.
    fn preprocess(&mut self, frame: &Frame) -> anyhow::Result<Array4<f32>> {
        let size = self.config.input_size;
        let src = fr::images::ImageRef::new(
            frame.width(),
            frame.height(),
            frame.image().as_raw(),
            fr::PixelType::U8x3,
        )
        .context("Failed to wrap frame for resizing")?;
        let mut dst = fr::images::Image::new(size, size, fr::PixelType::U8x3);

        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
        self.resizer
            .resize(&src, &mut dst, Some(&options))
            .context("Failed to resize frame to model input")?;

        let raw = dst.buffer();
        let side = size as usize;
        Ok(Array4::from_shape_fn(
            (1, 3, side, side),
            |(_, channel, y, x)| raw[(y * side + x) * 3 + channel] as f32 / 255.0,
        ))
    }
}

impl DetectionModel for YoloV8 {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            architecture: "YOLOv8".to_string(),
            framework: if self.config.cuda {
                "ONNX Runtime (cuda)".to_string()
            } else {
                "ONNX Runtime (cpu)".to_string()
            },
            dataset: "COCO".to_string(),
        }
    }

    fn infer(&mut self, frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        let input_array = self.preprocess(frame)?;
        let input_array_dyn = CowArray::from(input_array).into_dyn();
        let input = ort::inputs![TensorRef::from_array_view(&input_array_dyn)?];

        let outputs = self.session.run(input).context("YOLOv8 inference failed")?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract YOLOv8 output tensor")?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let &[_, num_attrs, num_proposals] = dims.as_slice() else {
            bail!("unexpected YOLOv8 output shape {dims:?}");
        };

        let params = DecodeParams {
            input_size: self.config.input_size,
            frame: frame.dimensions(),
            conf_threshold: self.config.conf_threshold,
        };
        let candidates =
            decode_proposals(data, num_attrs as usize, num_proposals as usize, &params)?;

        Ok(nms(candidates, self.config.nms_threshold)
            .into_iter()
            .map(|c| Detection::new(coco_classes::name(c.class_idx), c.confidence, c.bbox))
            .collect())
    }
}
