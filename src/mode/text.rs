use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::announce::{announce, Announcer};
use crate::detect::{DetectionCapability, SharedBackend};
use crate::frame::Frame;
use crate::window::{plurality_by, CollectionWindow};

use super::gate::{ActivityGate, Ticket};
use super::ModeKind;

pub const DEFAULT_TEXT_WINDOW: Duration = Duration::from_secs(5);
pub const NO_TEXT_TEXT: &str = "لم يتم التعرف على نص";

/// Text reading mode: OCR every frame for a fixed window, then speak the string
/// recognised most often.
pub struct TextReader {
    backend: SharedBackend,
    window_len: Duration,
    request_timeout: Duration,
    gate: ActivityGate,
    window: Option<CollectionWindow<String>>,
}

impl TextReader {
    pub fn new(backend: SharedBackend, window: Duration, request_timeout: Duration) -> Result<Self> {
        let supports = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?
            .supports(DetectionCapability::Text);
        if !supports {
            return Err(anyhow!("text reader requires a text-capable backend"));
        }
        Ok(Self {
            backend,
            window_len: window,
            request_timeout,
            gate: ActivityGate::new(),
            window: None,
        })
    }

    pub fn activate(&mut self, now: Instant, announcer: &mut dyn Announcer) {
        if let Some(notice) = ModeKind::TextReading.activation_notice() {
            announce(announcer, notice);
        }
        self.gate.activate();
        self.window = Some(CollectionWindow::new(now, self.window_len));
        log::info!("text: reading for {:.1}s", self.window_len.as_secs_f32());
    }

    pub fn deactivate(&mut self) {
        self.gate.deactivate();
        self.window = None;
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    /// Strings recognised in the current window.
    pub fn collected(&self) -> usize {
        self.window.as_ref().map_or(0, CollectionWindow::len)
    }

    pub fn begin_frame(&mut self, now: Instant) -> Option<Ticket> {
        self.gate.try_begin(now)
    }

    /// Blank and failed reads are skipped.
    pub fn complete_frame(&mut self, ticket: Ticket, text: Result<Option<String>>) {
        if !self.gate.finish(ticket) {
            log::debug!("text: dropping result for stale frame");
            return;
        }
        let text = match text {
            Ok(Some(text)) => text.trim().to_string(),
            Ok(None) => return,
            Err(e) => {
                log::warn!("text: reader failed, skipping frame: {:#}", e);
                return;
            }
        };
        if text.is_empty() {
            return;
        }
        if let Some(window) = self.window.as_mut() {
            log::debug!("text: read {:?}", text);
            window.push(text);
        }
    }

    pub fn on_frame(&mut self, frame: &Frame, now: Instant) {
        let Some(ticket) = self.begin_frame(now) else {
            return;
        };
        let text = match self.backend.lock() {
            Ok(mut backend) => backend.read_text(frame),
            Err(_) => Err(anyhow!("backend lock poisoned")),
        };
        self.complete_frame(ticket, text);
    }

    /// Speaks and returns the chosen text once the window has elapsed.
    pub fn tick(&mut self, now: Instant, announcer: &mut dyn Announcer) -> Option<String> {
        if self.gate.expire(now, self.request_timeout) {
            log::warn!("text: reader timed out, skipping frame");
        }
        if !self.window.as_ref().is_some_and(|w| w.has_elapsed(now)) {
            return None;
        }
        let entries = self.window.take()?.into_entries();
        let spoken = match plurality_by(&entries, |text| text.clone()) {
            Some((index, votes)) => {
                log::info!("text: {:?} votes={}/{}", entries[index], votes, entries.len());
                entries[index].clone()
            }
            None => {
                log::info!("text: nothing recognised");
                NO_TEXT_TEXT.to_string()
            }
        };
        announce(announcer, &spoken);
        self.gate.deactivate();
        Some(spoken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::MemoryAnnouncer;
    use crate::detect::{ReplayBackend, StubBackend};
    use std::sync::{Arc, Mutex};

    fn reader(backend: ReplayBackend) -> TextReader {
        TextReader::new(
            Arc::new(Mutex::new(backend)),
            DEFAULT_TEXT_WINDOW,
            Duration::from_secs(15),
        )
        .unwrap()
    }

    fn blank() -> Frame {
        Frame::new(Vec::new(), 0, 0)
    }

    #[test]
    fn speaks_most_frequent_text_after_window() {
        let mut mode = reader(ReplayBackend::reading(["EX1T", "EXIT", "", "EXIT", "EX1T", " EXIT "]));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();
        mode.activate(start, &mut announcer);
        assert_eq!(announcer.last(), Some("جارٍ تحليل النص"));

        for i in 0..6 {
            let now = start + Duration::from_millis(500 * i);
            mode.on_frame(&blank(), now);
            assert!(mode.tick(now, &mut announcer).is_none());
        }
        assert_eq!(mode.collected(), 5);

        let spoken = mode.tick(start + DEFAULT_TEXT_WINDOW, &mut announcer);
        assert_eq!(spoken.as_deref(), Some("EXIT"));
        assert_eq!(announcer.last(), Some("EXIT"));
        assert!(!mode.is_active());
    }

    #[test]
    fn ties_go_to_first_read() {
        let mut mode = reader(ReplayBackend::reading(["STOP", "EXIT", "EXIT", "STOP"]));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();
        mode.activate(start, &mut announcer);
        for _ in 0..4 {
            mode.on_frame(&blank(), start);
        }
        assert_eq!(
            mode.tick(start + DEFAULT_TEXT_WINDOW, &mut announcer).as_deref(),
            Some("STOP")
        );
    }

    #[test]
    fn empty_window_says_no_text() {
        let mut mode = reader(ReplayBackend::reading(Vec::<String>::new()));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();
        mode.activate(start, &mut announcer);
        mode.on_frame(&blank(), start);
        let spoken = mode.tick(start + DEFAULT_TEXT_WINDOW, &mut announcer);
        assert_eq!(spoken.as_deref(), Some(NO_TEXT_TEXT));
    }

    #[test]
    fn reactivation_discards_collected_text() {
        let mut mode = reader(ReplayBackend::reading(["EXIT"]));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();
        mode.activate(start, &mut announcer);
        mode.on_frame(&blank(), start);
        assert_eq!(mode.collected(), 1);
        mode.deactivate();
        mode.activate(start + Duration::from_secs(1), &mut announcer);
        assert_eq!(mode.collected(), 0);
    }

    #[test]
    fn requires_text_capable_backend() {
        let backend = ReplayBackend::new(DetectionCapability::Banknote, Vec::new());
        assert!(TextReader::new(
            Arc::new(Mutex::new(backend)),
            DEFAULT_TEXT_WINDOW,
            Duration::from_secs(15)
        )
        .is_err());
        let stub: SharedBackend = Arc::new(Mutex::new(StubBackend::new()));
        assert!(TextReader::new(stub, DEFAULT_TEXT_WINDOW, Duration::from_secs(15)).is_ok());
    }
}
