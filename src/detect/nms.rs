use std::cmp::Ordering;

use crate::detect::result::Detection;

/// Default overlap above which the weaker of two detections is suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Greedy non-max suppression.
///
/// Detections are ranked by confidence, highest first. The sort is stable, so equal
/// confidences keep their input order. Each kept detection removes every remaining
/// one whose IoU with it is strictly above `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| by_confidence_desc(a.confidence, b.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept
            .iter()
            .all(|keeper| keeper.iou(&candidate) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

// NaN confidences rank below every finite score.
fn by_confidence_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
