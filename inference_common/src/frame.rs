use std::sync::Arc;

use image::RgbImage;

use crate::img_dimensions::ImgDimensions;

/// Handle to one captured camera image.
///
/// Cloning is cheap, the pixels are shared. Frames are consumed by a single
/// processing cycle and then dropped.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Wraps a packed RGB24 buffer, returning `None` when the length does not
    /// match `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbImage::from_vec(width, height, pixels).map(Self::new)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> ImgDimensions {
        ImgDimensions::new(self.width(), self.height())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_checks_buffer_length() {
        assert!(Frame::from_rgb(4, 2, vec![0; 4 * 2 * 3]).is_some());
        assert!(Frame::from_rgb(4, 2, vec![0; 10]).is_none());
    }

    #[test]
    fn clones_share_pixels() {
        let frame = Frame::new(RgbImage::new(8, 6));
        let clone = frame.clone();
        assert!(std::ptr::eq(frame.image(), clone.image()));
        assert_eq!(clone.dimensions(), ImgDimensions::new(8, 6));
    }
}
