mod backend;
mod backends;
mod decode;
mod nms;
mod registry;
mod result;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::{ReplayBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::replay::ReplayFrame;
pub use decode::{decode_rows, DEFAULT_CONFIDENCE_FLOOR};
pub use nms::{non_max_suppression, DEFAULT_IOU_THRESHOLD};
pub use registry::{BackendRegistry, SharedBackend};
pub use result::{BoundingBox, ClassId, Detection};
