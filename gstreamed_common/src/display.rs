use anyhow::{Context, anyhow};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::{DynamicImage, RgbaImage};
use inference_common::frame::Frame;
use inference_common::img_dimensions::ImgDimensions;

use crate::pipeline::DISPLAY_PIPELINE;

/// Native preview window showing the camera frame with the overlay on top.
pub struct GstDisplay {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    caps_dims: Option<ImgDimensions>,
}

impl GstDisplay {
    pub fn new() -> anyhow::Result<Self> {
        gst::init().context("Failed to initialize GStreamer")?;

        let pipeline = gst::parse::launch(DISPLAY_PIPELINE)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| anyhow!("Display pipeline is not a pipeline"))?;
        let appsrc = pipeline
            .by_name("src")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSrc>().ok())
            .context("Failed to get appsrc")?;

        pipeline
            .set_state(gst::State::Playing)
            .context("Failed to start display pipeline")?;
        Ok(Self {
            pipeline,
            appsrc,
            caps_dims: None,
        })
    }

    /// Pushes `frame` composed with `overlay` to the window.
    pub fn show(&mut self, frame: &Frame, overlay: &RgbaImage) -> anyhow::Result<()> {
        let dims = frame.dimensions();
        if self.caps_dims != Some(dims) {
            let caps = gst_video::VideoInfo::builder(
                gst_video::VideoFormat::Rgba,
                dims.width,
                dims.height,
            )
            .build()
            .context("Failed to build preview video info")?
            .to_caps()
            .context("Failed to build preview caps")?;
            self.appsrc.set_caps(Some(&caps));
            self.caps_dims = Some(dims);
        }

        let composed = compose(frame, overlay);
        let buffer = gst::Buffer::from_mut_slice(composed.into_raw());
        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| anyhow!("Failed to push preview frame: {e:?}"))?;
        Ok(())
    }
}

impl Drop for GstDisplay {
    fn drop(&mut self) {
        let _ = self.appsrc.end_of_stream();
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            log::warn!("Failed to stop display pipeline: {e}");
        }
    }
}

/// Alpha-blends the overlay onto an RGBA copy of the frame.
pub fn compose(frame: &Frame, overlay: &RgbaImage) -> RgbaImage {
    let mut out = DynamicImage::ImageRgb8(frame.image().clone()).to_rgba8();
    image::imageops::overlay(&mut out, overlay, 0, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    #[test]
    fn transparent_overlay_keeps_frame() {
        let frame = Frame::new(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let composed = compose(&frame, &RgbaImage::new(4, 4));
        assert_eq!(composed.get_pixel(2, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn opaque_overlay_pixels_win() {
        let frame = Frame::new(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let mut overlay = RgbaImage::new(4, 4);
        overlay.put_pixel(1, 1, Rgba([0, 255, 0, 255]));

        let composed = compose(&frame, &overlay);
        assert_eq!(composed.get_pixel(1, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(composed.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }
}
