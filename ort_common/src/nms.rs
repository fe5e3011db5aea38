use inference_common::bbox::Bbox;

/// A decoded model proposal before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_idx: usize,
    pub confidence: f32,
    pub bbox: Bbox,
}

/// Greedy per-class non-maximum suppression.
///
/// Keeps the most confident candidate of every cluster of same-class boxes
/// overlapping by more than `iou_threshold`. Output is sorted by confidence,
/// highest first.
pub fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_idx == candidate.class_idx && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(class_idx: usize, confidence: f32, x: f32) -> Candidate {
        Candidate {
            class_idx,
            confidence,
            bbox: Bbox::new(x, 0.0, 100.0, 100.0),
        }
    }

    #[test]
    fn overlapping_same_class_keeps_best() {
        let kept = nms(vec![cand(0, 0.6, 5.0), cand(0, 0.9, 0.0)], 0.45);
        assert_eq!(kept, vec![cand(0, 0.9, 0.0)]);
    }

    #[test]
    fn different_classes_are_not_suppressed() {
        let kept = nms(vec![cand(0, 0.9, 0.0), cand(16, 0.8, 5.0)], 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn distant_boxes_survive_and_are_sorted() {
        let kept = nms(vec![cand(0, 0.5, 0.0), cand(0, 0.7, 300.0)], 0.45);
        let confidences: Vec<f32> = kept.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.7, 0.5]);
    }
}
