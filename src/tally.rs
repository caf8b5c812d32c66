//! Per-frame class counts and their grouping signature.

use std::collections::BTreeMap;
use std::fmt;

use crate::detect::{ClassId, Detection};
use crate::values::ClassValueTable;

/// Count and average confidence per class for one processed frame.
///
/// Immutable once built; the collection window only ever appends tallies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameTally {
    counts: BTreeMap<ClassId, u32>,
    avg_confidence: BTreeMap<ClassId, f32>,
}

impl FrameTally {
    /// Tally post-NMS detections. Classes outside `table` are a caller bug:
    /// debug builds assert, release builds skip the detection.
    pub fn from_detections(detections: &[Detection], table: &ClassValueTable) -> Self {
        let mut counts: BTreeMap<ClassId, u32> = BTreeMap::new();
        let mut sums: BTreeMap<ClassId, f32> = BTreeMap::new();

        for det in detections {
            debug_assert!(
                table.contains(det.class),
                "class index {} outside value table of {}",
                det.class,
                table.len()
            );
            if !table.contains(det.class) {
                log::warn!("skipping detection with unknown class {}", det.class);
                continue;
            }
            *counts.entry(det.class).or_insert(0) += 1;
            *sums.entry(det.class).or_insert(0.0) += det.confidence;
        }

        let avg_confidence = sums
            .into_iter()
            .map(|(class, sum)| (class, sum / counts[&class] as f32))
            .collect();

        Self {
            counts,
            avg_confidence,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<ClassId, u32> {
        &self.counts
    }

    pub fn count(&self, class: ClassId) -> u32 {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    pub fn avg_confidence(&self, class: ClassId) -> Option<f32> {
        self.avg_confidence.get(&class).copied()
    }

    /// Total number of detections tallied.
    pub fn total_count(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Sum of `count * value` over present classes.
    pub fn total_value(&self, table: &ClassValueTable) -> u64 {
        self.counts
            .iter()
            .filter_map(|(class, count)| table.value(*class).map(|v| *count as u64 * v as u64))
            .sum()
    }

    pub fn signature(&self) -> Signature {
        Signature::of(&self.counts)
    }
}

/// Grouping key for plurality voting: `"class:count"` pairs sorted by class, `;`-joined.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    fn of(counts: &BTreeMap<ClassId, u32>) -> Self {
        let key = counts
            .iter()
            .map(|(class, count)| format!("{}:{}", class, count))
            .collect::<Vec<_>>()
            .join(";");
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
