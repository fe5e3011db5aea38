use std::path::PathBuf;

use clap::Parser;
use gstreamed_common::VideoInput;
use inference_common::capture::CaptureConstraints;
use inference_common::img_dimensions::ImgDimensions;
use ort_common::YoloConfig;
use tracing_subscriber::prelude::*;
use visionlite::config::{ViewerConfig, DEFAULT_DEVICE};
use visionlite::orchestrator::LoopConfig;
use visionlite::{headless, tui};

#[derive(Debug, Parser)]
pub struct Args {
    /// Camera to use: "webcam" for the default device, a device path like
    /// "/dev/video2", "auto" to let GStreamer pick, or "test" for a test pattern.
    #[arg(default_value = "webcam")]
    input: String,
    /// Yolov8 onnx model file to use.
    #[arg(long, short, default_value = "_models/yolov8s.onnx")]
    model: PathBuf,
    /// Whether to attempt to use `cuda` hw acceleration.
    /// This may silently fail and fallback to cpu acceleration presently.
    #[arg(long, action, default_value = "false")]
    cuda: bool,
    /// Confidence threshold for detections (0.0-1.0). Higher = fewer false positives
    #[arg(long, default_value = "0.5")]
    conf_threshold: f32,
    /// NMS IoU threshold for removing duplicate detections (0.0-1.0)
    #[arg(long, default_value = "0.45")]
    nms_threshold: f32,
    /// Ideal capture width.
    #[arg(long, default_value = "640")]
    width: u32,
    /// Ideal capture height.
    #[arg(long, default_value = "480")]
    height: u32,
    /// Detection cycles per second to aim for.
    #[arg(long, default_value = "60")]
    refresh_hz: f64,
    /// TrueType font for the overlay labels. Defaults to an installed system
    /// font such as DejaVu Sans; labels are drawn without text if none is found.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Show the camera with the overlay in a preview window.
    #[arg(long, action, default_value = "false")]
    live: bool,
    /// Enable interactive TUI dashboard
    #[arg(long, action, default_value = "false")]
    tui: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ViewerConfig> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Capture size must be non-zero, got {}x{}", self.width, self.height);
        }
        if !(self.refresh_hz > 0.0) {
            anyhow::bail!("Refresh rate must be positive, got {}", self.refresh_hz);
        }
        Ok(ViewerConfig {
            input: VideoInput::parse(&self.input, DEFAULT_DEVICE)?,
            constraints: CaptureConstraints {
                ideal: ImgDimensions::new(self.width, self.height),
                ..Default::default()
            },
            yolo: YoloConfig {
                model_path: self.model,
                cuda: self.cuda,
                conf_threshold: self.conf_threshold,
                nms_threshold: self.nms_threshold,
                ..Default::default()
            },
            looping: LoopConfig {
                refresh_hz: self.refresh_hz,
            },
            font: self.font,
            live: self.live,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging - suppress if TUI is active
    if !args.tui {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn,visionlite=info,ort_common=info,gstreamed_common=info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        // Log output would corrupt the dashboard.
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new("off"))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
            .init();
        log::set_max_level(log::LevelFilter::Off);
    }

    let tui = args.tui;
    let config = args.into_config()?;
    log::info!("Starting viewer: {config:?}");

    if tui {
        tui::run(config)
    } else {
        headless::run(config)
    }
}
