use std::fmt;

/// Pixel dimensions of a frame or drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImgDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImgDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for ImgDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
