use anyhow::{anyhow, Result};

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Perception capabilities a backend can serve.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionCapability {
    Banknote,
    HandPose,
    FacialExpression,
    Text,
}

/// Detector backend trait.
///
/// Backends wrap an opaque model. They receive a borrowed frame and return raw
/// detections; suppression and tallying happen downstream.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on a frame. Implementations must not retain the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Recognise the most prominent line of text in a frame.
    ///
    /// Only backends that support `DetectionCapability::Text` override this.
    fn read_text(&mut self, _frame: &Frame) -> Result<Option<String>> {
        Err(anyhow!("backend '{}' cannot read text", self.name()))
    }

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
