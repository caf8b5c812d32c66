#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::decode::{decode_rows, DEFAULT_CONFIDENCE_FLOOR};
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Tract-based backend for a local ONNX banknote detector.
///
/// Expects a square RGB input and a single output of either `[1, N, 4 + K]` or
/// `[1, 4 + K, N]` rows. Frames must already be resized to the model input.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    num_classes: usize,
    confidence_floor: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32, num_classes: usize) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            num_classes,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
        })
    }

    /// Override the default confidence floor.
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        if frame.width != self.input_size || frame.height != self.input_size {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                frame.width,
                frame.height,
                self.input_size,
                self.input_size
            ));
        }

        let pixels = frame.pixels();
        let side = self.input_size as usize;
        let expected_len = side
            .checked_mul(side)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
            let idx = (y * side + x) * 3 + channel;
            pixels[idx] as f32 / 255.0
        });

        Ok(input.into_tensor())
    }

    fn extract_rows(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let stride = 4 + self.num_classes;
        let shape = view.shape().to_vec();
        match shape.as_slice() {
            [1, _, c] if *c == stride => Ok(view.iter().copied().collect()),
            [1, c, n] if *c == stride => {
                let mut rows = Vec::with_capacity(n * c);
                for i in 0..*n {
                    for j in 0..*c {
                        rows.push(view[[0, j, i]]);
                    }
                }
                Ok(rows)
            }
            other => Err(anyhow!(
                "unexpected detector output shape {:?} for {} classes",
                other,
                self.num_classes
            )),
        }
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::Banknote)
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let rows = self.extract_rows(outputs)?;
        decode_rows(&rows, self.num_classes, self.confidence_floor)
    }
}
