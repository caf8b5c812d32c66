use std::collections::VecDeque;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::Detection;
use crate::frame::Frame;

/// One scripted frame in a replay file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReplayFrame {
    /// Offset from the start of the replay, in milliseconds.
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// Recognised text, for text-reading scripts.
    #[serde(default)]
    pub text: Option<String>,
    /// Simulates a detector failure for this frame.
    #[serde(default)]
    pub fail: bool,
}

#[derive(Debug, Deserialize)]
struct ReplayScript {
    frames: Vec<ReplayFrame>,
}

/// Backend that plays back scripted detections, one entry per `detect` call.
///
/// Once the script is exhausted every further frame yields no detections.
pub struct ReplayBackend {
    name: &'static str,
    capability: DetectionCapability,
    frames: VecDeque<ReplayFrame>,
}

impl ReplayBackend {
    pub fn new(capability: DetectionCapability, frames: Vec<ReplayFrame>) -> Self {
        Self {
            name: "replay",
            capability,
            frames: frames.into(),
        }
    }

    /// Register under a different name, so several scripts can share a registry.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Build a text-reading backend that recognises one string per frame.
    pub fn reading<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        let frames = texts
            .into_iter()
            .map(|text| ReplayFrame {
                text: Some(text.into()),
                ..ReplayFrame::default()
            })
            .collect();
        Self::new(DetectionCapability::Text, frames).with_name("replay-text")
    }

    /// Build a backend that returns the same detections for `count` frames.
    pub fn repeating(capability: DetectionCapability, detections: Vec<Detection>, count: usize) -> Self {
        let frames = (0..count)
            .map(|_| ReplayFrame {
                detections: detections.clone(),
                ..ReplayFrame::default()
            })
            .collect();
        Self::new(capability, frames)
    }

    /// Load a replay script (`{"frames": [...]}`) from a JSON file.
    pub fn from_json_file(capability: DetectionCapability, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {}", path.display()))?;
        Self::from_json_str(capability, &raw)
            .with_context(|| format!("invalid replay file {}", path.display()))
    }

    pub fn from_json_str(capability: DetectionCapability, raw: &str) -> Result<Self> {
        let script: ReplayScript = serde_json::from_str(raw)?;
        Ok(Self::new(capability, script.frames))
    }

    /// Scripted timestamp of the next frame, if any remain.
    pub fn next_offset_ms(&self) -> Option<u64> {
        self.frames.front().map(|frame| frame.at_ms)
    }

    /// Scripted timestamps of every remaining frame.
    pub fn offsets_ms(&self) -> Vec<u64> {
        self.frames.iter().map(|frame| frame.at_ms).collect()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        capability == self.capability
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        match self.frames.pop_front() {
            Some(frame) if frame.fail => Err(anyhow!("scripted detector failure")),
            Some(frame) => Ok(frame.detections),
            None => Ok(Vec::new()),
        }
    }

    fn read_text(&mut self, _frame: &Frame) -> Result<Option<String>> {
        match self.frames.pop_front() {
            Some(frame) if frame.fail => Err(anyhow!("scripted reader failure")),
            Some(frame) => Ok(frame.text),
            None => Ok(None),
        }
    }
}
