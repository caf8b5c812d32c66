//! Perception modes and their dispatch.
//!
//! Every mode is owned by the `AppContext` and driven from the host loop through
//! `activate` / `deactivate` / `tick`. Work that leaves the tick (a detector call, a
//! remote request) holds a `Ticket`; deactivation invalidates outstanding tickets.

use std::fmt;
use std::time::Instant;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::announce::Announcer;
use crate::frame::Frame;
use crate::window::Resolution;

mod gate;
mod label;
mod money;
mod remote;
mod text;

pub use gate::{ActivityGate, Ticket};
pub use label::{LabelMode, LabelPolicy, EXPRESSION_LABELS, HAND_SIGN_LABELS};
pub use money::MoneyCounter;
pub use remote::RemoteMode;
pub use text::{TextReader, DEFAULT_TEXT_WINDOW, NO_TEXT_TEXT};

/// The app's selectable functions, keyed as the companion server sends them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Distance,
    Money,
    Clothes,
    SignLanguage,
    SceneDescription,
    FacialExpression,
    TextReading,
}

impl ModeKind {
    /// Menu order.
    pub const ALL: [ModeKind; 7] = [
        ModeKind::Distance,
        ModeKind::Money,
        ModeKind::Clothes,
        ModeKind::SignLanguage,
        ModeKind::SceneDescription,
        ModeKind::FacialExpression,
        ModeKind::TextReading,
    ];

    pub fn from_key(key: u8) -> Result<Self> {
        match key {
            1 => Ok(ModeKind::Distance),
            2 => Ok(ModeKind::Money),
            3 => Ok(ModeKind::Clothes),
            4 => Ok(ModeKind::SignLanguage),
            5 => Ok(ModeKind::SceneDescription),
            6 => Ok(ModeKind::FacialExpression),
            7 => Ok(ModeKind::TextReading),
            other => Err(anyhow!("unknown mode key {}", other)),
        }
    }

    pub fn key(self) -> u8 {
        match self {
            ModeKind::Distance => 1,
            ModeKind::Money => 2,
            ModeKind::Clothes => 3,
            ModeKind::SignLanguage => 4,
            ModeKind::SceneDescription => 5,
            ModeKind::FacialExpression => 6,
            ModeKind::TextReading => 7,
        }
    }

    /// Spoken name.
    pub fn display_name(self) -> &'static str {
        match self {
            ModeKind::Distance => "التعرف على المسافة",
            ModeKind::Money => "التعرف على النقود",
            ModeKind::Clothes => "التعرف على الملابس",
            ModeKind::SignLanguage => "لغة الإشارة",
            ModeKind::SceneDescription => "وصف المشهد",
            ModeKind::FacialExpression => "التعرف على التعابير",
            ModeKind::TextReading => "قراءة النص",
        }
    }

    pub(crate) fn activation_notice(self) -> Option<&'static str> {
        match self {
            ModeKind::SceneDescription => Some("جاري تحليل المشهد"),
            ModeKind::TextReading => Some("جارٍ تحليل النص"),
            _ => None,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::Distance => "distance",
            ModeKind::Money => "money",
            ModeKind::Clothes => "clothes",
            ModeKind::SignLanguage => "sign_language",
            ModeKind::SceneDescription => "scene_description",
            ModeKind::FacialExpression => "facial_expression",
            ModeKind::TextReading => "text_reading",
        };
        f.write_str(name)
    }
}

/// Command pushed by the companion server: `{"key": 2, "distance": 0.0}`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Command {
    pub key: u8,
    #[serde(default)]
    pub distance: f32,
}

impl Command {
    pub fn select(kind: ModeKind) -> Self {
        Self {
            key: kind.key(),
            distance: 0.0,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| anyhow!("invalid command: {}", e))
    }
}

/// One constructed mode instance.
pub enum Mode {
    Money(MoneyCounter),
    Remote(RemoteMode),
    Label(LabelMode),
    Text(TextReader),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Money(_) => ModeKind::Money,
            Mode::Remote(mode) => mode.kind(),
            Mode::Label(mode) => mode.kind(),
            Mode::Text(_) => ModeKind::TextReading,
        }
    }

    pub fn activate(&mut self, now: Instant, announcer: &mut dyn Announcer) {
        match self {
            Mode::Money(mode) => mode.activate(now),
            Mode::Remote(mode) => mode.activate(now, announcer),
            Mode::Label(mode) => mode.activate(now),
            Mode::Text(mode) => mode.activate(now, announcer),
        }
    }

    pub fn deactivate(&mut self) {
        match self {
            Mode::Money(mode) => mode.deactivate(),
            Mode::Remote(mode) => mode.deactivate(),
            Mode::Label(mode) => mode.deactivate(),
            Mode::Text(mode) => mode.deactivate(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Mode::Money(mode) => mode.is_active(),
            Mode::Remote(mode) => mode.is_active(),
            Mode::Label(mode) => mode.is_active(),
            Mode::Text(mode) => mode.is_active(),
        }
    }

    /// Feed a camera frame to a mode that runs a local detector.
    pub fn on_frame(&mut self, frame: &Frame, now: Instant, announcer: &mut dyn Announcer) {
        match self {
            Mode::Money(mode) => mode.on_frame(frame, now),
            Mode::Label(mode) => mode.on_frame(frame, now, announcer),
            Mode::Text(mode) => mode.on_frame(frame, now),
            // Remote modes are fed by the host through begin_request.
            Mode::Remote(_) => {}
        }
    }

    pub fn tick(&mut self, now: Instant, announcer: &mut dyn Announcer) -> Option<Resolution> {
        match self {
            Mode::Money(mode) => mode.tick(now, announcer),
            Mode::Remote(mode) => {
                mode.tick(now);
                None
            }
            Mode::Label(mode) => {
                mode.tick(now);
                None
            }
            Mode::Text(mode) => {
                mode.tick(now, announcer);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_menu_order() {
        for (i, kind) in ModeKind::ALL.iter().enumerate() {
            assert_eq!(kind.key() as usize, i + 1);
            assert_eq!(ModeKind::from_key(kind.key()).unwrap(), *kind);
        }
        assert!(ModeKind::from_key(0).is_err());
        assert_eq!(ModeKind::from_key(7).unwrap(), ModeKind::TextReading);
        assert!(ModeKind::from_key(8).is_err());
    }

    #[test]
    fn parses_server_command() {
        let cmd = Command::from_json(r#"{"key": 1, "distance": 42.5}"#).unwrap();
        assert_eq!(cmd.key, 1);
        assert_eq!(cmd.distance, 42.5);
        let cmd = Command::from_json(r#"{"key": 2}"#).unwrap();
        assert_eq!(cmd, Command::select(ModeKind::Money));
        assert!(Command::from_json("{}").is_err());
    }
}
