//! The capture, detect and render loop.
//!
//! One [`Orchestrator`] owns the camera stream, the loaded model, the overlay
//! surface and the rate window. It runs on a single task: a cycle is armed
//! with a deadline, and the next one is only armed once the previous cycle
//! has rendered, so at most one detection is ever in flight.

use std::time::Duration;

use inference_common::annotate;
use inference_common::capture::{
    CaptureAccessError, CaptureConstraints, CaptureDevice, CaptureStream,
};
use inference_common::detection::DetectionBatch;
use inference_common::frame::Frame;
use inference_common::frame_times::{AggregatedTimes, FrameTimes};
use inference_common::img_dimensions::ImgDimensions;
use inference_common::model::{DetectionModel, ModelInfo, ModelLoadError};
use inference_common::rate::RateEstimator;
use inference_common::surface::Surface;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::detector::DetectorAdapter;
use crate::status::{LoopState, ModelStatus, ViewerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// Start when idle, stop otherwise.
    Toggle,
    /// Stop and leave the loop.
    Quit,
}

/// Whether the loop should keep serving commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    /// Cycles per second to aim for.
    pub refresh_hz: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { refresh_hz: 60.0 }
    }
}

impl LoopConfig {
    pub fn frame_interval(&self) -> Duration {
        if self.refresh_hz > 0.0 {
            Duration::from_secs_f64(1.0 / self.refresh_hz)
        } else {
            Duration::ZERO
        }
    }
}

/// Receives every rendered frame together with its overlay.
pub trait Presenter<S> {
    fn present(&mut self, frame: &Frame, overlay: &S) -> anyhow::Result<()>;
}

pub struct Orchestrator<D: CaptureDevice, M, S> {
    /// Lent to the blocking pool while the camera is being opened.
    device: Option<D>,
    constraints: CaptureConstraints,
    config: LoopConfig,
    surface: S,
    presenter: Option<Box<dyn Presenter<S>>>,

    detector: Option<DetectorAdapter<M>>,
    model_status: ModelStatus,
    stream: Option<D::Stream>,
    pending_cycle: Option<Instant>,
    state: LoopState,

    rate: RateEstimator,
    last_batch: DetectionBatch,
    last_dims: Option<ImgDimensions>,
    capture_error: Option<String>,
    times: AggregatedTimes,
    epoch: Instant,

    commands: mpsc::Receiver<Command>,
    status: watch::Sender<ViewerStatus>,
}

impl<D, M, S> Orchestrator<D, M, S>
where
    D: CaptureDevice + Send + 'static,
    D::Stream: Send + 'static,
    M: DetectionModel,
    S: Surface,
{
    pub fn new(
        device: D,
        constraints: CaptureConstraints,
        config: LoopConfig,
        surface: S,
        commands: mpsc::Receiver<Command>,
        status: watch::Sender<ViewerStatus>,
    ) -> Self {
        Self {
            device: Some(device),
            constraints,
            config,
            surface,
            presenter: None,
            detector: None,
            model_status: ModelStatus::Loading,
            stream: None,
            pending_cycle: None,
            state: LoopState::Idle,
            rate: RateEstimator::new(),
            last_batch: DetectionBatch::empty(),
            last_dims: None,
            capture_error: None,
            times: AggregatedTimes::default(),
            epoch: Instant::now(),
            commands,
            status,
        }
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter<S>>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn model_status(&self) -> &ModelStatus {
        &self.model_status
    }

    /// Deadline of the next armed cycle, if any.
    pub fn pending_cycle(&self) -> Option<Instant> {
        self.pending_cycle
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn rate(&self) -> &RateEstimator {
        &self.rate
    }

    pub fn snapshot(&self) -> ViewerStatus {
        ViewerStatus {
            state: self.state,
            model: self.model_status.clone(),
            model_info: self.detector.as_ref().map(|d| d.info().clone()),
            fps: self.rate.estimate(),
            top: self.last_batch.displayed().to_vec(),
            total: self.last_batch.len(),
            frame_dims: self.last_dims,
            capture_error: self.capture_error.clone(),
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }

    /// Loads the model once, serving commands in the meantime.
    ///
    /// Returns [`Flow::Quit`] if a quit arrived before loading finished.
    pub async fn load_model<F>(&mut self, loader: F) -> Flow
    where
        F: FnOnce() -> Result<M, ModelLoadError> + Send + 'static,
    {
        self.model_status = ModelStatus::Loading;
        self.publish();

        let load = DetectorAdapter::load(loader);
        tokio::pin!(load);
        let loaded = loop {
            tokio::select! {
                loaded = &mut load => break loaded,
                cmd = self.commands.recv() => {
                    let flow = match cmd {
                        Some(cmd) => self.handle(cmd).await,
                        None => Flow::Quit,
                    };
                    if flow == Flow::Quit {
                        log::info!("Quit while the model was loading");
                        return Flow::Quit;
                    }
                }
            }
        };

        match loaded {
            Ok(detector) => {
                self.detector = Some(detector);
                self.model_status = ModelStatus::Ready;
            }
            Err(e) => {
                log::error!("Failed to load model: {e}");
                self.model_status = ModelStatus::Failed(e.to_string());
            }
        }
        self.publish();
        Flow::Continue
    }

    /// Serves commands and runs armed cycles until quit.
    pub async fn run(&mut self) {
        loop {
            let deadline = self.pending_cycle;
            let flow = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => {
                        self.stop();
                        Flow::Quit
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.run_cycle().await
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }
        log::info!("Viewer loop finished");
    }

    pub async fn handle(&mut self, cmd: Command) -> Flow {
        log::debug!("Command: {cmd:?}");
        match cmd {
            Command::Start => return self.start().await,
            Command::Stop => self.stop(),
            Command::Toggle if self.state == LoopState::Idle => return self.start().await,
            Command::Toggle => self.stop(),
            Command::Quit => {
                self.stop();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Acquires the camera and arms the first cycle.
    ///
    /// The device is opened on the blocking pool while commands keep being
    /// served. A stop or quit arriving in the meantime releases the stream
    /// as soon as it opens. Returns [`Flow::Quit`] if a quit arrived.
    pub async fn start(&mut self) -> Flow {
        if self.state != LoopState::Idle {
            log::debug!("Start ignored, already {:?}", self.state);
            return Flow::Continue;
        }
        match &self.model_status {
            ModelStatus::Ready => {}
            ModelStatus::Loading => {
                log::info!("Start refused, model is still loading");
                return Flow::Continue;
            }
            ModelStatus::Failed(_) => {
                log::warn!("Start refused, model failed to load");
                return Flow::Continue;
            }
        }
        let Some(mut device) = self.device.take() else {
            log::error!("Start refused, camera is unavailable");
            self.capture_error = Some("camera is unavailable".to_string());
            self.publish();
            return Flow::Continue;
        };

        self.state = LoopState::Requesting;
        self.capture_error = None;
        self.publish();

        let constraints = self.constraints.clone();
        let mut open = tokio::task::spawn_blocking(move || {
            let result = device.open(&constraints);
            (device, result)
        });

        // Whether the stream should be released once open returns.
        let mut abandoned = false;
        let mut flow = Flow::Continue;
        let opened = loop {
            tokio::select! {
                opened = &mut open => break opened,
                cmd = self.commands.recv(), if flow == Flow::Continue => {
                    log::debug!("Command while requesting camera: {cmd:?}");
                    match cmd {
                        Some(Command::Start) => abandoned = false,
                        Some(Command::Stop) => abandoned = true,
                        Some(Command::Toggle) => abandoned = !abandoned,
                        Some(Command::Quit) | None => {
                            abandoned = true;
                            flow = Flow::Quit;
                        }
                    }
                }
            }
        };

        let result = match opened {
            Ok((device, result)) => {
                self.device = Some(device);
                result
            }
            Err(e) => {
                log::error!("Camera open task did not complete: {e}");
                Err(CaptureAccessError::Start("camera open did not complete".to_string()))
            }
        };
        match result {
            Ok(mut stream) if abandoned => {
                log::info!("Capture stopped before the first frame");
                stream.stop();
                self.state = LoopState::Idle;
            }
            Ok(stream) => {
                log::info!("Capture started");
                self.stream = Some(stream);
                self.state = LoopState::Active;
                self.schedule_next();
            }
            Err(e) if abandoned => {
                log::debug!("Camera access failed after stop: {e}");
                self.state = LoopState::Idle;
            }
            Err(e) => {
                log::error!("Camera access failed: {e}");
                self.capture_error = Some(e.to_string());
                self.state = LoopState::Idle;
            }
        }
        self.publish();
        flow
    }

    /// Releases the camera and resets all per-session state. Safe to call
    /// in any state, any number of times.
    pub fn stop(&mut self) {
        self.pending_cycle = None;
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.surface.clear();
        self.rate.reset();
        self.last_batch = DetectionBatch::empty();
        self.last_dims = None;

        if self.state != LoopState::Idle {
            log::info!("Capture stopped");
            self.log_times();
        }
        self.state = LoopState::Idle;
        self.publish();
    }

    fn schedule_next(&mut self) {
        self.pending_cycle = Some(Instant::now() + self.config.frame_interval());
    }

    /// Runs one capture, detect, render step and arms the next one.
    ///
    /// Commands arriving while detection is in flight are served
    /// immediately; if one of them stops the loop the detection result is
    /// dropped unrendered.
    pub async fn run_cycle(&mut self) -> Flow {
        self.pending_cycle = None;
        if self.state != LoopState::Active {
            return Flow::Continue;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Flow::Continue;
        };
        let Some(detector) = self.detector.clone() else {
            return Flow::Continue;
        };

        if let Err(e) = stream.status() {
            log::error!("Capture failed: {e}");
            self.capture_error = Some(e.to_string());
            self.stop();
            return Flow::Continue;
        }

        let mut times = FrameTimes::default();
        let start = Instant::now();
        let Some(frame) = stream.latest_frame() else {
            // Camera still warming up.
            self.schedule_next();
            return Flow::Continue;
        };
        times.acquire = start.elapsed();

        let start = Instant::now();
        let detection = detector.detect(frame.clone());
        tokio::pin!(detection);
        let batch = loop {
            tokio::select! {
                batch = &mut detection => break batch,
                cmd = self.commands.recv() => {
                    let flow = match cmd {
                        Some(cmd) => self.handle(cmd).await,
                        None => {
                            self.stop();
                            Flow::Quit
                        }
                    };
                    if flow == Flow::Quit || self.state != LoopState::Active {
                        log::debug!("Cycle interrupted, dropping detection result");
                        return flow;
                    }
                }
            }
        };
        times.detect = start.elapsed();

        let start = Instant::now();
        let dims = frame.dimensions();
        annotate::ensure_surface_size(&mut self.surface, dims);
        annotate::render(&batch, &mut self.surface, dims.width, dims.height);
        times.annotate = start.elapsed();

        if let Some(presenter) = self.presenter.as_mut() {
            let start = Instant::now();
            if let Err(e) = presenter.present(&frame, &self.surface) {
                log::warn!("Failed to present frame: {e:#}");
            }
            times.present = start.elapsed();
        }

        self.rate.record(self.epoch.elapsed().as_secs_f64() * 1000.0);
        log::debug!("{times:?}");
        self.times.push(times);

        self.last_batch = batch;
        self.last_dims = Some(dims);
        self.publish();
        self.schedule_next();
        Flow::Continue
    }

    fn log_times(&mut self) {
        if self.times.is_empty() {
            return;
        }
        log::info!(
            "Processed {} frames, avg {:?}, min {:?}, max {:?}",
            self.times.len(),
            self.times.avg(true).total(),
            self.times.min(true).total(),
            self.times.max(true).total()
        );
        self.times.clear();
    }

    /// Info of the loaded model, if any.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.detector.as_ref().map(DetectorAdapter::info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_interval_follows_refresh_rate() {
        let config = LoopConfig::default();
        assert_eq!(config.frame_interval(), Duration::from_secs_f64(1.0 / 60.0));
        let config = LoopConfig { refresh_hz: 0.0 };
        assert_eq!(config.frame_interval(), Duration::ZERO);
    }
}
