/// Axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bbox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from its top-left and bottom-right corners.
    pub fn from_corners(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self::new(xmin, ymin, (xmax - xmin).max(0.0), (ymax - ymin).max(0.0))
    }

    /// Builds a box from its center point and size, as YOLO-style heads emit them.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Scales both axes independently, e.g. from model input space to frame space.
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Restricts the box to `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        let xmin = self.x.clamp(0.0, width);
        let ymin = self.y.clamp(0.0, height);
        let xmax = self.xmax().clamp(0.0, width);
        let ymax = self.ymax().clamp(0.0, height);
        Self::from_corners(xmin, ymin, xmax, ymax)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Bbox) -> f32 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.xmax().min(other.xmax());
        let iy2 = self.ymax().min(other.ymax());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        inter / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_and_extent() {
        let bbox = Bbox::from_corners(10.0, 10.0, 60.0, 110.0);
        assert_eq!(bbox, Bbox::new(10.0, 10.0, 50.0, 100.0));
        assert_eq!(bbox.xmax(), 60.0);
        assert_eq!(bbox.ymax(), 110.0);
    }

    #[test]
    fn iou_of_disjoint_and_identical_boxes() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Bbox::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_half_overlap() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0);
        let b = Bbox::new(5.0, 0.0, 10.0, 10.0);
        // 50 / (100 + 100 - 50)
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn nan_is_not_finite() {
        assert!(Bbox::new(1.0, 2.0, 3.0, 4.0).is_finite());
        assert!(!Bbox::new(1.0, 2.0, f32::NAN, 4.0).is_finite());
        assert!(!Bbox::from_center(f32::INFINITY, 0.0, 1.0, 1.0).is_finite());
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let bbox = Bbox::new(-5.0, 290.0, 20.0, 30.0).clamp_to(300.0, 300.0);
        assert_eq!(bbox, Bbox::new(0.0, 290.0, 15.0, 10.0));
    }
}
