use std::cmp::Ordering;

use crate::bbox::Bbox;

/// How many detections the side panel lists per frame.
pub const TOP_K: usize = 5;

/// One object instance reported by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    pub bbox: Bbox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: Bbox) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Confidence as a percentage, e.g. `93.0` for `0.93`.
    pub fn percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Text of the overlay label tag: class name and confidence with one decimal.
    pub fn label_text(&self) -> String {
        format!("{} {:.1}%", self.label, self.percent())
    }
}

fn by_confidence_desc(a: &Detection, b: &Detection) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
}

/// All detections for a single frame, ranked by confidence, highest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionBatch {
    detections: Vec<Detection>,
}

impl DetectionBatch {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ranks `detections` by descending confidence. The sort is stable, so
    /// ties keep the order the model reported them in.
    pub fn ranked(mut detections: Vec<Detection>) -> Self {
        detections.sort_by(by_confidence_desc);
        Self { detections }
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }

    /// The `k` most confident detections, highest first.
    pub fn top(&self, k: usize) -> &[Detection] {
        &self.detections[..k.min(self.detections.len())]
    }

    /// The detections the side panel shows.
    pub fn displayed(&self) -> &[Detection] {
        self.top(TOP_K)
    }
}

impl<'a> IntoIterator for &'a DetectionBatch {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, Bbox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn label_text_rounds_to_one_decimal() {
        let d = Detection::new("person", 0.93, Bbox::new(10.0, 10.0, 50.0, 100.0));
        assert_eq!(d.label_text(), "person 93.0%");

        let d = det("cup", 0.4567);
        assert_eq!(d.label_text(), "cup 45.7%");
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(det("a", 1.7).confidence, 1.0);
        assert_eq!(det("a", -0.2).confidence, 0.0);
        assert_eq!(det("a", f32::NAN).confidence, 0.0);
    }

    #[test]
    fn top_five_of_eight() {
        let confidences = [0.31, 0.92, 0.15, 0.77, 0.56, 0.88, 0.42, 0.64];
        let batch = DetectionBatch::ranked(
            confidences
                .iter()
                .enumerate()
                .map(|(i, c)| det(&format!("obj{i}"), *c))
                .collect(),
        );

        let shown: Vec<f32> = batch.displayed().iter().map(|d| d.confidence).collect();
        assert_eq!(shown, vec![0.92, 0.88, 0.77, 0.64, 0.56]);
        // Everything is still kept for the overlay.
        assert_eq!(batch.len(), 8);
    }

    #[test]
    fn top_of_short_batch_returns_everything() {
        let batch = DetectionBatch::ranked(vec![det("a", 0.2), det("b", 0.9)]);
        assert_eq!(batch.displayed().len(), 2);
        assert_eq!(batch.displayed()[0].label, "b");
        assert!(DetectionBatch::empty().displayed().is_empty());
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let batch = DetectionBatch::ranked(vec![det("first", 0.5), det("second", 0.5)]);
        let labels: Vec<&str> = batch.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second"]);
    }
}
