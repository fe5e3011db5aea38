//! Live camera capture through an `appsink` pipeline.
//!
//! The sink keeps a single buffer and drops older ones, so
//! [`GstCaptureStream::latest_frame`] always hands out the newest image and
//! a slow consumer never builds a backlog.

use anyhow::Context;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use inference_common::capture::{
    CaptureAccessError, CaptureConstraints, CaptureDevice, CaptureStream, Facing,
};
use inference_common::frame::Frame;

use crate::pipeline::{self, VideoInput};

/// How long to wait for the pipeline to reach `Playing` before giving up.
const STARTUP_TIMEOUT_SECS: u64 = 5;

/// Opens GStreamer capture pipelines for one configured input.
#[derive(Debug, Clone)]
pub struct GstCamera {
    input: VideoInput,
}

impl GstCamera {
    pub fn new(input: VideoInput) -> Self {
        Self { input }
    }

    pub fn input(&self) -> &VideoInput {
        &self.input
    }
}

impl CaptureDevice for GstCamera {
    type Stream = GstCaptureStream;

    fn open(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> Result<GstCaptureStream, CaptureAccessError> {
        gst::init().map_err(|e| CaptureAccessError::Start(e.to_string()))?;

        if constraints.facing != Facing::User {
            log::debug!("Facing mode {:?} is not selectable here, ignoring", constraints.facing);
        }

        let description = pipeline::capture_pipeline_description(&self.input, constraints);
        log::debug!("Capture pipeline: {description}");

        let pipeline = gst::parse::launch(&description)
            .map_err(|e| CaptureAccessError::Start(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CaptureAccessError::Start("not a pipeline".to_string()))?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| CaptureAccessError::Start("failed to get appsink".to_string()))?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| CaptureAccessError::Start("pipeline without bus".to_string()))?;

        let mut stream = GstCaptureStream {
            pipeline,
            appsink,
            bus,
            failure: None,
            stopped: false,
        };

        let started = stream.pipeline.set_state(gst::State::Playing).is_ok()
            && stream
                .pipeline
                .state(gst::ClockTime::from_seconds(STARTUP_TIMEOUT_SECS))
                .0
                .is_ok();
        if let Err(err) = stream.status() {
            stream.stop();
            return Err(err);
        }
        if !started {
            stream.stop();
            return Err(CaptureAccessError::Start(format!(
                "pipeline did not start for {:?}",
                self.input
            )));
        }

        log::info!("Camera started: {:?}", self.input);
        Ok(stream)
    }
}

/// A playing capture pipeline. Stops itself when dropped.
pub struct GstCaptureStream {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    bus: gst::Bus,
    failure: Option<CaptureAccessError>,
    stopped: bool,
}

impl GstCaptureStream {
    /// Drains the bus, returning the first error or end-of-stream seen.
    fn poll_bus(&self) -> Option<CaptureAccessError> {
        while let Some(msg) = self.bus.pop() {
            use gst::MessageView;
            match msg.view() {
                MessageView::Eos(..) => {
                    return Some(CaptureAccessError::Ended("end of stream".to_string()));
                }
                MessageView::Error(err) => {
                    log::error!(
                        "Capture error from {:?}: {} ({:?})",
                        err.src().map(|s| s.path_string()),
                        err.error(),
                        err.debug()
                    );
                    return Some(classify_error(err));
                }
                MessageView::StateChanged(s) => {
                    if msg.src() == Some(self.pipeline.upcast_ref()) {
                        log::debug!("Capture state: {:?} -> {:?}", s.old(), s.current());
                    }
                }
                _ => {}
            }
        }
        None
    }
}

impl CaptureStream for GstCaptureStream {
    fn latest_frame(&mut self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        let sample = self.appsink.try_pull_sample(gst::ClockTime::ZERO)?;
        match sample_to_frame(&sample) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("Dropping unreadable frame: {e:#}");
                None
            }
        }
    }

    fn status(&mut self) -> Result<(), CaptureAccessError> {
        if self.failure.is_none() {
            self.failure = self.poll_bus();
        }
        if self.failure.is_none() && !self.stopped && self.appsink.is_eos() {
            self.failure = Some(CaptureAccessError::Ended("end of stream".to_string()));
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            log::warn!("Failed to stop capture pipeline: {e}");
        } else {
            log::info!("Camera stopped");
        }
    }
}

impl Drop for GstCaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn classify_error(err: &gst::message::Error) -> CaptureAccessError {
    let error = err.error();
    let message = error.to_string();
    match error.kind::<gst::ResourceError>() {
        Some(gst::ResourceError::NotFound) => CaptureAccessError::NoDevice(message),
        Some(
            gst::ResourceError::OpenRead
            | gst::ResourceError::OpenReadWrite
            | gst::ResourceError::NotAuthorized,
        ) => CaptureAccessError::PermissionDenied(message),
        _ => CaptureAccessError::Start(message),
    }
}

fn sample_to_frame(sample: &gst::Sample) -> anyhow::Result<Frame> {
    let caps = sample.caps().context("Sample without caps")?;
    let info = gst_video::VideoInfo::from_caps(caps).context("Sample caps are not raw video")?;
    let buffer = sample.buffer().context("Sample without buffer")?;
    let map = buffer.map_readable().context("Failed to map buffer")?;

    let stride = usize::try_from(info.stride()[0]).context("Negative stride")?;
    let pixels = pack_rows(map.as_slice(), info.width(), info.height(), stride)
        .context("Buffer shorter than its caps")?;
    Frame::from_rgb(info.width(), info.height(), pixels).context("Frame size mismatch")
}

/// Copies RGB rows out of a buffer whose rows may be padded to `stride` bytes.
fn pack_rows(data: &[u8], width: u32, height: u32, stride: usize) -> Option<Vec<u8>> {
    let row = width as usize * 3;
    if stride == row {
        return data.get(..row * height as usize).map(<[u8]>::to_vec);
    }

    let mut pixels = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        pixels.extend_from_slice(data.get(start..start + row)?);
    }
    Some(pixels)
}
