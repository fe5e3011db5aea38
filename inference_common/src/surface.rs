//! Immediate-mode 2D drawing surfaces for the detection overlay.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::Context;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::bbox::Bbox;
use crate::img_dimensions::ImgDimensions;

/// Average glyph advance relative to the font size, used when no font is loaded.
const FALLBACK_ADVANCE: f32 = 0.55;

/// Common locations of a sans-serif font on Linux distributions.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

/// The drawing primitives the overlay renderer needs.
///
/// Coordinates are in surface pixels; shapes partially outside the surface
/// are clipped. Text is positioned by the top-left corner of its line box.
pub trait Surface {
    fn dimensions(&self) -> ImgDimensions;

    /// Changes the surface size. Content is discarded.
    fn resize(&mut self, dims: ImgDimensions);

    /// Makes `rect` fully transparent.
    fn clear_rect(&mut self, rect: Bbox);

    fn stroke_rect(&mut self, rect: Bbox, color: Color, line_width: f32);

    fn fill_rect(&mut self, rect: Bbox, color: Color);

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_px: f32, color: Color);

    /// Width of `text` in pixels when drawn at `font_px`.
    fn measure_text(&self, text: &str, font_px: f32) -> f32;

    /// Clears the whole surface.
    fn clear(&mut self) {
        let dims = self.dimensions();
        self.clear_rect(Bbox::new(0.0, 0.0, dims.width as f32, dims.height as f32));
    }
}

/// A [`Surface`] backed by an RGBA image, transparent where nothing was drawn.
pub struct ImageSurface {
    image: RgbaImage,
    font: Option<FontVec>,
}

impl ImageSurface {
    pub fn new(dims: ImgDimensions, font: Option<FontVec>) -> Self {
        if font.is_none() {
            log::warn!("No overlay font loaded, label text will not be drawn");
        }
        Self {
            image: RgbaImage::new(dims.width, dims.height),
            font,
        }
    }

    /// Loads a TrueType/OpenType font for label text.
    pub fn load_font(path: &Path) -> anyhow::Result<FontVec> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read font file {path:?}"))?;
        FontVec::try_from_vec(bytes).with_context(|| format!("Invalid font file {path:?}"))
    }

    /// First loadable font among `candidates`.
    pub fn first_font<P: AsRef<Path>>(candidates: &[P]) -> Option<FontVec> {
        candidates.iter().find_map(|path| {
            let path = path.as_ref();
            if !path.is_file() {
                return None;
            }
            match Self::load_font(path) {
                Ok(font) => {
                    log::debug!("Using overlay font {path:?}");
                    Some(font)
                }
                Err(e) => {
                    log::debug!("Skipping font {path:?}: {e:#}");
                    None
                }
            }
        })
    }

    /// A font from the usual system locations, if one is installed.
    pub fn system_font() -> Option<FontVec> {
        Self::first_font(SYSTEM_FONT_PATHS)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// True when no pixel has been drawn since the last clear.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }
}

// Integer pixel rect covering `rect`, or `None` when it is empty or not finite.
fn to_pixel_rect(rect: Bbox) -> Option<Rect> {
    if !(rect.x.is_finite() && rect.y.is_finite()) {
        return None;
    }
    let x = rect.x.round() as i32;
    let y = rect.y.round() as i32;
    let w = rect.width.round();
    let h = rect.height.round();
    if !(w >= 1.0 && h >= 1.0 && w.is_finite() && h.is_finite()) {
        return None;
    }
    Some(Rect::at(x, y).of_size(w as u32, h as u32))
}

impl Surface for ImageSurface {
    fn dimensions(&self) -> ImgDimensions {
        ImgDimensions::new(self.image.width(), self.image.height())
    }

    fn resize(&mut self, dims: ImgDimensions) {
        self.image = RgbaImage::new(dims.width, dims.height);
    }

    fn clear_rect(&mut self, rect: Bbox) {
        let (w, h) = self.image.dimensions();
        let bounded = rect.clamp_to(w as f32, h as f32);
        let x0 = bounded.x.floor() as u32;
        let y0 = bounded.y.floor() as u32;
        let x1 = (bounded.xmax().ceil() as u32).min(w);
        let y1 = (bounded.ymax().ceil() as u32).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, Color::TRANSPARENT.to_rgba());
            }
        }
    }

    fn stroke_rect(&mut self, rect: Bbox, color: Color, line_width: f32) {
        // Strokes are centered on the rectangle outline.
        let half = ((line_width.max(1.0) - 1.0) / 2.0).round() as i32;
        for offset in -half..=half {
            let o = offset as f32;
            let grown = Bbox::new(
                rect.x - o,
                rect.y - o,
                rect.width + 2.0 * o,
                rect.height + 2.0 * o,
            );
            if let Some(r) = to_pixel_rect(grown) {
                draw_hollow_rect_mut(&mut self.image, r, color.to_rgba());
            }
        }
    }

    fn fill_rect(&mut self, rect: Bbox, color: Color) {
        if let Some(r) = to_pixel_rect(rect) {
            draw_filled_rect_mut(&mut self.image, r, color.to_rgba());
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_px: f32, color: Color) {
        let Some(font) = &self.font else {
            return;
        };
        draw_text_mut(
            &mut self.image,
            color.to_rgba(),
            x.round() as i32,
            y.round() as i32,
            PxScale::from(font_px),
            font,
            text,
        );
    }

    fn measure_text(&self, text: &str, font_px: f32) -> f32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(font_px), font, text).0 as f32,
            None => text.chars().count() as f32 * font_px * FALLBACK_ADVANCE,
        }
    }
}
