//! Draws detection boxes and label tags onto an overlay surface.

use crate::bbox::Bbox;
use crate::detection::DetectionBatch;
use crate::img_dimensions::ImgDimensions;
use crate::surface::{Color, Surface};

pub const BOX_COLOR: Color = Color::GREEN;
pub const BOX_LINE_WIDTH: f32 = 3.0;
pub const LABEL_FONT_PX: f32 = 16.0;
pub const LABEL_HEIGHT: f32 = 20.0;
/// Extra tag width around the label text.
pub const LABEL_PADDING: f32 = 10.0;
pub const LABEL_TEXT_COLOR: Color = Color::BLACK;

/// Resizes `surface` to `dims` if they differ. Returns true when it did.
pub fn ensure_surface_size<S: Surface + ?Sized>(surface: &mut S, dims: ImgDimensions) -> bool {
    if surface.dimensions() == dims {
        return false;
    }
    log::debug!("Resizing overlay {} -> {dims}", surface.dimensions());
    surface.resize(dims);
    true
}

/// Replaces the overlay content with the boxes of `batch`.
///
/// The whole `width` x `height` area is cleared first, so nothing from a
/// previous batch survives. Detections are drawn in batch order, later ones
/// on top.
pub fn render<S: Surface + ?Sized>(batch: &DetectionBatch, surface: &mut S, width: u32, height: u32) {
    surface.clear_rect(Bbox::new(0.0, 0.0, width as f32, height as f32));

    for detection in batch {
        let bbox = detection.bbox;
        surface.stroke_rect(bbox, BOX_COLOR, BOX_LINE_WIDTH);

        // Label tag sits right above the box.
        let text = detection.label_text();
        let text_width = surface.measure_text(&text, LABEL_FONT_PX);
        let tag = Bbox::new(
            bbox.x,
            bbox.y - LABEL_HEIGHT,
            text_width + LABEL_PADDING,
            LABEL_HEIGHT,
        );
        surface.fill_rect(tag, BOX_COLOR);
        surface.fill_text(
            &text,
            bbox.x + LABEL_PADDING / 2.0,
            bbox.y - LABEL_HEIGHT + 2.0,
            LABEL_FONT_PX,
            LABEL_TEXT_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Detection;
    use crate::surface::ImageSurface;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear(Bbox),
        Stroke(Bbox, Color, f32),
        Fill(Bbox, Color),
        Text(String, f32, f32),
        Resize(ImgDimensions),
    }

    struct RecordingSurface {
        dims: ImgDimensions,
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new(w: u32, h: u32) -> Self {
            Self {
                dims: ImgDimensions::new(w, h),
                ops: Vec::new(),
            }
        }
    }

    impl Surface for RecordingSurface {
        fn dimensions(&self) -> ImgDimensions {
            self.dims
        }

        fn resize(&mut self, dims: ImgDimensions) {
            self.dims = dims;
            self.ops.push(Op::Resize(dims));
        }

        fn clear_rect(&mut self, rect: Bbox) {
            self.ops.push(Op::Clear(rect));
        }

        fn stroke_rect(&mut self, rect: Bbox, color: Color, line_width: f32) {
            self.ops.push(Op::Stroke(rect, color, line_width));
        }

        fn fill_rect(&mut self, rect: Bbox, color: Color) {
            self.ops.push(Op::Fill(rect, color));
        }

        fn fill_text(&mut self, text: &str, x: f32, y: f32, _font_px: f32, _color: Color) {
            self.ops.push(Op::Text(text.to_string(), x, y));
        }

        fn measure_text(&self, text: &str, _font_px: f32) -> f32 {
            text.len() as f32 * 8.0
        }
    }

    fn person() -> Detection {
        Detection::new("person", 0.93, Bbox::new(10.0, 10.0, 50.0, 100.0))
    }

    #[test]
    fn single_person_on_300x300() {
        let mut surface = RecordingSurface::new(300, 300);
        let batch = DetectionBatch::ranked(vec![person()]);

        render(&batch, &mut surface, 300, 300);

        let text_width = "person 93.0%".len() as f32 * 8.0;
        assert_eq!(
            surface.ops,
            vec![
                Op::Clear(Bbox::new(0.0, 0.0, 300.0, 300.0)),
                Op::Stroke(Bbox::new(10.0, 10.0, 50.0, 100.0), BOX_COLOR, 3.0),
                Op::Fill(Bbox::new(10.0, -10.0, text_width + 10.0, 20.0), BOX_COLOR),
                Op::Text("person 93.0%".to_string(), 15.0, -8.0),
            ]
        );

        let Op::Stroke(rect, ..) = &surface.ops[1] else {
            panic!("expected a stroke");
        };
        assert_eq!((rect.x, rect.y, rect.xmax(), rect.ymax()), (10.0, 10.0, 60.0, 110.0));
    }

    #[test]
    fn clears_before_drawing_anything() {
        let mut surface = RecordingSurface::new(100, 100);
        let batch = DetectionBatch::ranked(vec![
            Detection::new("cup", 0.5, Bbox::new(30.0, 40.0, 10.0, 10.0)),
            person(),
        ]);

        render(&batch, &mut surface, 100, 100);

        assert!(matches!(surface.ops[0], Op::Clear(_)));
        assert_eq!(
            surface.ops.iter().filter(|op| matches!(op, Op::Clear(_))).count(),
            1
        );
        // Batch order: highest confidence first.
        let strokes: Vec<Bbox> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke(r, ..) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![person().bbox, Bbox::new(30.0, 40.0, 10.0, 10.0)]);
    }

    #[test]
    fn empty_batch_wipes_stale_boxes() {
        let mut surface = ImageSurface::new(ImgDimensions::new(120, 160), None);
        render(&DetectionBatch::ranked(vec![person()]), &mut surface, 120, 160);
        assert!(!surface.is_blank());

        render(&DetectionBatch::empty(), &mut surface, 120, 160);
        assert!(surface.is_blank());
    }

    #[test]
    fn nan_sized_box_does_not_panic() {
        let mut surface = ImageSurface::new(ImgDimensions::new(100, 100), None);
        let det = Detection::new("person", 0.93, Bbox::new(10.0, 10.0, f32::NAN, 20.0));

        render(&DetectionBatch::ranked(vec![det]), &mut surface, 100, 100);

        assert_eq!(surface.image().dimensions(), (100, 100));
    }

    #[test]
    fn label_text_is_drawn_with_a_system_font() {
        let Some(font) = ImageSurface::system_font() else {
            eprintln!("no system font installed, skipping");
            return;
        };
        let mut surface = ImageSurface::new(ImgDimensions::new(300, 300), Some(font));
        let det = Detection::new("person", 0.93, Bbox::new(10.0, 30.0, 50.0, 100.0));

        render(&DetectionBatch::ranked(vec![det]), &mut surface, 300, 300);

        // The tag spans y 10..30; its text is black on the green fill.
        let black = (10..30)
            .flat_map(|y| (0..300).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let p = surface.image().get_pixel(x, y).0;
                p[3] == 255 && p[0] < 64 && p[1] < 64 && p[2] < 64
            })
            .count();
        assert!(black > 0);
    }

    #[test]
    fn render_is_idempotent() {
        let batch = DetectionBatch::ranked(vec![person()]);
        let mut surface = ImageSurface::new(ImgDimensions::new(120, 160), None);

        render(&batch, &mut surface, 120, 160);
        let first = surface.image().clone();
        render(&batch, &mut surface, 120, 160);

        assert_eq!(&first, surface.image());
    }

    #[test]
    fn surface_follows_frame_size() {
        let mut surface = RecordingSurface::new(300, 300);

        assert!(!ensure_surface_size(&mut surface, ImgDimensions::new(300, 300)));
        assert!(surface.ops.is_empty());

        assert!(ensure_surface_size(&mut surface, ImgDimensions::new(640, 480)));
        assert_eq!(surface.ops, vec![Op::Resize(ImgDimensions::new(640, 480))]);
        assert_eq!(surface.dimensions(), ImgDimensions::new(640, 480));
    }
}
