//! Wires the GStreamer camera, the YOLOv8 model and the image overlay into
//! an [`Orchestrator`].

use anyhow::Context;
use gstreamed_common::{GstCamera, GstDisplay};
use inference_common::frame::Frame;
use inference_common::model::ModelLoadError;
use inference_common::surface::ImageSurface;
use ort_common::YoloV8;
use tokio::sync::{mpsc, watch};

use crate::config::ViewerConfig;
use crate::orchestrator::{Command, Orchestrator, Presenter};
use crate::status::ViewerStatus;

pub type Viewer = Orchestrator<GstCamera, YoloV8, ImageSurface>;

/// Queued commands before senders have to wait.
pub const COMMAND_BUFFER: usize = 16;

impl Presenter<ImageSurface> for GstDisplay {
    fn present(&mut self, frame: &Frame, overlay: &ImageSurface) -> anyhow::Result<()> {
        self.show(frame, overlay.image())
    }
}

pub fn build(
    config: &ViewerConfig,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<ViewerStatus>,
) -> anyhow::Result<Viewer> {
    let font = match config.font.as_deref() {
        Some(path) => Some(ImageSurface::load_font(path)?),
        None => ImageSurface::system_font(),
    };
    let surface = ImageSurface::new(config.constraints.ideal, font);

    let viewer = Orchestrator::new(
        GstCamera::new(config.input.clone()),
        config.constraints.clone(),
        config.looping,
        surface,
        commands,
        status,
    );
    if !config.live {
        return Ok(viewer);
    }
    let display = GstDisplay::new().context("Failed to open preview window")?;
    Ok(viewer.with_presenter(Box::new(display)))
}

pub fn model_loader(
    config: &ViewerConfig,
) -> impl FnOnce() -> Result<YoloV8, ModelLoadError> + Send + 'static {
    let yolo = config.yolo.clone();
    move || YoloV8::load(yolo)
}
