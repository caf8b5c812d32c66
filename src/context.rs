//! Application context: owns every mode, the menu and the announcer.
//!
//! Built once at startup from the configuration and a backend registry. The host
//! forwards server commands, taps, camera frames and remote replies, and calls
//! `tick` from its update loop.

use std::time::Instant;

use anyhow::{anyhow, Result};

use crate::announce::{announce, Announcer};
use crate::config::YourEyesConfig;
use crate::detect::{BackendRegistry, DetectionCapability};
use crate::frame::Frame;
use crate::menu::{MenuEvent, MenuSelector};
use crate::mode::{
    Command, LabelMode, Mode, ModeKind, MoneyCounter, RemoteMode, TextReader, Ticket,
};
use crate::window::Resolution;
use crate::words::to_arabic_words;

pub const GREETING: &str = "مرحبا";
pub const SELECTED_PREFIX: &str = "تم اختيار";
pub const CENTIMETRES: &str = "سنتيمتر";

pub struct AppContext<A: Announcer> {
    modes: Vec<Mode>,
    menu: MenuSelector,
    announcer: A,
}

impl<A: Announcer> AppContext<A> {
    /// Build one instance of each mode the registered backends can serve.
    ///
    /// Money counting is mandatory; label and text modes are only built when a
    /// backend with the matching capability is registered. The menu lists the
    /// distance query plus the modes that were built.
    pub fn new(config: &YourEyesConfig, registry: &BackendRegistry, announcer: A) -> Result<Self> {
        let banknotes = registry.backend_for_capability(DetectionCapability::Banknote)?;
        let money = MoneyCounter::new(
            banknotes,
            config.money.class_table()?,
            config.money.window,
            config.money.iou_threshold,
            config.request_timeout,
        )?
        .with_confidence_floor(config.money.confidence_floor);
        let mut modes = vec![Mode::Money(money)];
        modes.push(Mode::Remote(RemoteMode::new(
            ModeKind::Clothes,
            config.clothes_timeout,
        )));
        if let Ok(backend) = registry.backend_for_capability(DetectionCapability::HandPose) {
            modes.push(Mode::Label(LabelMode::sign_language(backend)));
        } else {
            log::warn!("no hand pose backend registered; sign language disabled");
        }
        modes.push(Mode::Remote(RemoteMode::new(
            ModeKind::SceneDescription,
            config.scene_timeout,
        )));
        if let Ok(backend) = registry.backend_for_capability(DetectionCapability::FacialExpression) {
            modes.push(Mode::Label(LabelMode::facial_expression(backend)));
        } else {
            log::warn!("no facial expression backend registered; expressions disabled");
        }
        if let Ok(backend) = registry.backend_for_capability(DetectionCapability::Text) {
            modes.push(Mode::Text(TextReader::new(
                backend,
                config.text_window,
                config.request_timeout,
            )?));
        } else {
            log::warn!("no text backend registered; text reading disabled");
        }

        let available = ModeKind::ALL
            .into_iter()
            .filter(|kind| {
                *kind == ModeKind::Distance || modes.iter().any(|mode| mode.kind() == *kind)
            })
            .collect();
        Ok(Self {
            modes,
            menu: MenuSelector::new(config.tap_window).with_modes(available),
            announcer,
        })
    }

    pub fn start(&mut self) {
        log::info!("context started with {} modes", self.modes.len());
        announce(&mut self.announcer, GREETING);
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }

    pub fn announcer_mut(&mut self) -> &mut A {
        &mut self.announcer
    }

    pub fn mode(&self, kind: ModeKind) -> Option<&Mode> {
        self.modes.iter().find(|mode| mode.kind() == kind)
    }

    pub fn mode_mut(&mut self, kind: ModeKind) -> Option<&mut Mode> {
        self.modes.iter_mut().find(|mode| mode.kind() == kind)
    }

    pub fn active_mode(&self) -> Option<ModeKind> {
        self.modes
            .iter()
            .find(|mode| mode.is_active())
            .map(Mode::kind)
    }

    pub fn menu(&self) -> &MenuSelector {
        &self.menu
    }

    /// Apply a command from the companion server.
    ///
    /// Selecting a mode that was not built is an error and nothing is spoken.
    pub fn handle_command(&mut self, command: Command, now: Instant) -> Result<()> {
        let kind = ModeKind::from_key(command.key)?;
        if kind == ModeKind::Distance {
            let words = distance_words(command.distance)?;
            announce(&mut self.announcer, &format!("{} {}", words, CENTIMETRES));
            return Ok(());
        }
        if self.mode(kind).is_none() {
            return Err(anyhow!("mode {} is not available", kind));
        }
        announce(
            &mut self.announcer,
            &format!("{} {}", SELECTED_PREFIX, kind.display_name()),
        );
        self.activate(kind, now)
    }

    /// Deactivate every mode, then activate `kind`.
    pub fn activate(&mut self, kind: ModeKind, now: Instant) -> Result<()> {
        if !self.modes.iter().any(|mode| mode.kind() == kind) {
            return Err(anyhow!("mode {} is not available", kind));
        }
        self.deactivate_all();
        for mode in self.modes.iter_mut().filter(|mode| mode.kind() == kind) {
            log::info!("activating {}", kind);
            mode.activate(now, &mut self.announcer);
        }
        Ok(())
    }

    pub fn deactivate_all(&mut self) {
        for mode in self.modes.iter_mut().filter(|mode| mode.is_active()) {
            log::info!("deactivating {}", mode.kind());
            mode.deactivate();
        }
    }

    pub fn tap(&mut self, now: Instant) {
        if let Some(MenuEvent::Highlight(kind)) = self.menu.tap(now) {
            announce(&mut self.announcer, kind.display_name());
        }
    }

    pub fn on_frame(&mut self, frame: &Frame, now: Instant) {
        for mode in self.modes.iter_mut().filter(|mode| mode.is_active()) {
            mode.on_frame(frame, now, &mut self.announcer);
        }
    }

    /// Start a remote request for the active describer mode, if it is ready.
    pub fn begin_remote_request(&mut self, now: Instant) -> Option<(ModeKind, &'static str, Ticket)> {
        self.modes.iter_mut().find_map(|mode| match mode {
            Mode::Remote(remote) if remote.is_active() => remote
                .begin_request(now)
                .map(|ticket| (remote.kind(), remote.route(), ticket)),
            _ => None,
        })
    }

    /// Deliver a remote reply body. Returns true when a reply was spoken.
    pub fn complete_remote_request(
        &mut self,
        kind: ModeKind,
        ticket: Ticket,
        body: Result<String>,
    ) -> bool {
        let announcer = &mut self.announcer;
        let Some(Mode::Remote(remote)) = self.modes.iter_mut().find(|mode| mode.kind() == kind)
        else {
            log::warn!("no remote mode {}", kind);
            return false;
        };
        // A skipped reply arrives as blank text so the mode stays active.
        let reply = body.and_then(|body| Ok(remote.parse_reply(&body)?.unwrap_or_default()));
        remote.complete_request(ticket, reply, announcer)
    }

    /// Advance the menu and every mode. Returns a money resolution when one was spoken.
    pub fn tick(&mut self, now: Instant) -> Option<Resolution> {
        if let Some(MenuEvent::Confirm(kind)) = self.menu.tick(now) {
            if let Err(e) = self.handle_command(Command::select(kind), now) {
                log::warn!("menu: cannot select {}: {:#}", kind, e);
            }
        }
        let mut resolved = None;
        for mode in self.modes.iter_mut() {
            if let Some(resolution) = mode.tick(now, &mut self.announcer) {
                resolved = Some(resolution);
            }
        }
        resolved
    }
}

/// Whole centimetres in words; the fraction is dropped.
fn distance_words(distance: f32) -> Result<String> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(anyhow!("distance must be a non-negative number, got {}", distance));
    }
    if distance >= u32::MAX as f32 {
        return Err(anyhow!("distance {} is out of range", distance));
    }
    Ok(to_arabic_words(distance.trunc() as u32))
}
