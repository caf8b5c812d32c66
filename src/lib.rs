//! YourEyes perception core
//!
//! Aggregates banknote detections over a short collection window, picks the
//! representative frame by plurality vote and speaks the total in Egyptian Arabic.
//! The surrounding app modes, the tap-driven menu and the announcer seam live here
//! too; camera capture, model execution and speech synthesis stay outside.
//!
//! # Pipeline
//!
//! frame → `DetectorBackend` → `non_max_suppression` → `FrameTally` →
//! `WindowAggregator` → `render_money_summary` → `Announcer`
//!
//! # Module Structure
//!
//! - `detect`: detections, IoU/NMS, output decoding, backends and registry
//! - `tally`, `window`: per-frame counts and the timed majority vote
//! - `words`, `summary`: Arabic number words and the spoken total
//! - `mode`, `menu`, `context`: mode lifecycle, tap selection, orchestration
//! - `announce`: where text leaves the crate

pub mod announce;
pub mod config;
pub mod context;
pub mod detect;
pub mod frame;
pub mod menu;
pub mod mode;
pub mod summary;
pub mod tally;
pub mod values;
pub mod window;
pub mod words;

pub use announce::{announce, Announcer, LogAnnouncer, MemoryAnnouncer};
pub use config::YourEyesConfig;
pub use context::AppContext;
pub use detect::{
    non_max_suppression, BackendRegistry, BoundingBox, ClassId, Detection, DetectionCapability,
    DetectorBackend,
};
pub use frame::Frame;
pub use menu::{MenuEvent, MenuSelector};
pub use mode::{Command, Mode, ModeKind, MoneyCounter, TextReader};
pub use summary::render_money_summary;
pub use tally::{FrameTally, Signature};
pub use values::ClassValueTable;
pub use window::{Resolution, WindowAggregator};
pub use words::{decimal_to_arabic_words, to_arabic_words};

#[cfg(feature = "announce-http")]
pub use announce::HttpAnnouncer;
