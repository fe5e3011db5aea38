use inference_common::capture::CaptureConstraints;

/// Preview sink: composed RGBA frames pushed by the application.
pub const DISPLAY_PIPELINE: &str = "appsrc name=src is-live=true format=time do-timestamp=true ! \
     videoconvert ! autovideosink sync=false";

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoInput {
    /// A V4L2 device node such as `/dev/video0`.
    Device(String),
    /// Whatever camera `autovideosrc` picks.
    Auto,
    /// Synthetic moving pattern, no camera needed.
    TestPattern,
}

impl VideoInput {
    /// Parses the `input` argument: `webcam` (the default device), `auto`,
    /// `test`, or a device path.
    pub fn parse(input: &str, default_device: &str) -> anyhow::Result<Self> {
        let input = match input {
            "webcam" => Self::Device(default_device.to_string()),
            "auto" => Self::Auto,
            "test" => Self::TestPattern,
            path => Self::Device(path.to_string()),
        };
        if let Self::Device(path) = &input {
            // The path is spliced into a pipeline description.
            if path.is_empty() || path.contains(['"', '!']) {
                anyhow::bail!("Invalid video device path: {path:?}");
            }
        }
        Ok(input)
    }
}

/// Capture pipeline ending in an `appsink` named `sink` that keeps only the
/// newest RGB frame, scaled to the ideal size.
pub fn capture_pipeline_description(input: &VideoInput, constraints: &CaptureConstraints) -> String {
    let source = match input {
        VideoInput::Device(path) => format!("v4l2src device=\"{path}\""),
        VideoInput::Auto => "autovideosrc".to_string(),
        VideoInput::TestPattern => "videotestsrc pattern=ball is-live=true".to_string(),
    };
    format!(
        "{source} ! videoconvert ! videoscale ! \
         video/x-raw,format=RGB,width={},height={} ! \
         appsink name=sink max-buffers=1 drop=true sync=false",
        constraints.ideal.width, constraints.ideal.height
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_common::img_dimensions::ImgDimensions;

    #[test]
    fn parses_inputs() {
        assert_eq!(
            VideoInput::parse("webcam", "/dev/video0").unwrap(),
            VideoInput::Device("/dev/video0".to_string())
        );
        assert_eq!(
            VideoInput::parse("/dev/video2", "/dev/video0").unwrap(),
            VideoInput::Device("/dev/video2".to_string())
        );
        assert_eq!(VideoInput::parse("auto", "").unwrap(), VideoInput::Auto);
        assert_eq!(VideoInput::parse("test", "").unwrap(), VideoInput::TestPattern);
    }

    #[test]
    fn rejects_pipeline_injection() {
        assert!(VideoInput::parse("/dev/video0 ! filesink location=x", "").is_err());
        assert!(VideoInput::parse("webcam", "").is_err());
    }

    #[test]
    fn capture_description_requests_ideal_size() {
        let constraints = CaptureConstraints::default();
        let desc = capture_pipeline_description(
            &VideoInput::Device("/dev/video0".to_string()),
            &constraints,
        );
        assert!(desc.starts_with("v4l2src device=\"/dev/video0\""));
        assert!(desc.contains("video/x-raw,format=RGB,width=640,height=480"));
        assert!(desc.contains("appsink name=sink max-buffers=1 drop=true"));

        let constraints = CaptureConstraints {
            ideal: ImgDimensions::new(320, 240),
            ..Default::default()
        };
        let desc = capture_pipeline_description(&VideoInput::TestPattern, &constraints);
        assert!(desc.starts_with("videotestsrc"));
        assert!(desc.contains("width=320,height=240"));
    }
}
