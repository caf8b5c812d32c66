use anyhow::{anyhow, Result};

use crate::detect::result::{BoundingBox, Detection};

/// Scores below this are treated as background.
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.1;

/// Decode a flat detector head output into detections.
///
/// Each row is `[cx, cy, w, h, score_0, .., score_{k-1}]`. The row's class is the
/// arg-max score (first index wins on ties). Rows whose best score is below
/// `confidence_floor`, or that carry no positive score, are dropped.
pub fn decode_rows(
    output: &[f32],
    num_classes: usize,
    confidence_floor: f32,
) -> Result<Vec<Detection>> {
    if num_classes == 0 {
        return Err(anyhow!("decoder requires at least one class"));
    }
    let stride = 4 + num_classes;
    if output.len() % stride != 0 {
        return Err(anyhow!(
            "detector output length {} is not a multiple of row stride {}",
            output.len(),
            stride
        ));
    }

    let mut detections = Vec::new();
    for row in output.chunks_exact(stride) {
        let (geometry, scores) = row.split_at(4);
        let mut best: Option<(usize, f32)> = None;
        for (class, &score) in scores.iter().enumerate() {
            let current = best.map_or(0.0, |(_, s)| s);
            if score > current {
                best = Some((class, score));
            }
        }
        let Some((class, confidence)) = best else {
            continue;
        };
        if confidence < confidence_floor {
            continue;
        }
        let bbox = BoundingBox::from_center(geometry[0], geometry[1], geometry[2], geometry[3]);
        detections.push(Detection::new(bbox, confidence, class));
    }
    Ok(detections)
}
