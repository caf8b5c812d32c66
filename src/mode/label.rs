use std::time::{Duration, Instant};

use anyhow::anyhow;

use crate::announce::{announce, Announcer};
use crate::detect::{Detection, SharedBackend};
use crate::frame::Frame;

use super::gate::ActivityGate;
use super::ModeKind;

/// Hand sign labels in classifier order. Unknown indices read as "open hand".
pub const HAND_SIGN_LABELS: [&str; 8] = [
    "أهلاً", "نعم", "أشير", "حسنًا", "جيد", "آسف", "حرف سي", "سيء",
];
const HAND_SIGN_FALLBACK: &str = "مفتوح";

/// Facial expression labels in classifier order.
pub const EXPRESSION_LABELS: [&str; 7] = [
    "غضب", "اشمئزاز", "خوف", "سعادة", "حزن", "دهشة", "محايد",
];

/// When a label mode speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Speak a label once it has been stable for `hold`, at most once per `cooldown`.
    Stable { hold: Duration, cooldown: Duration },
    /// Speak the first label seen within `window`, then stop.
    FirstWithin { window: Duration },
}

/// Classifier-driven mode that speaks short labels (hand signs, expressions).
pub struct LabelMode {
    kind: ModeKind,
    backend: SharedBackend,
    labels: &'static [&'static str],
    fallback: Option<&'static str>,
    policy: LabelPolicy,
    gate: ActivityGate,
    started_at: Option<Instant>,
    candidate: Option<(&'static str, Instant)>,
    last_spoken_at: Option<Instant>,
}

impl LabelMode {
    pub fn sign_language(backend: SharedBackend) -> Self {
        Self::new(
            ModeKind::SignLanguage,
            backend,
            &HAND_SIGN_LABELS,
            Some(HAND_SIGN_FALLBACK),
            LabelPolicy::Stable {
                hold: Duration::from_millis(1500),
                cooldown: Duration::from_secs(5),
            },
        )
    }

    pub fn facial_expression(backend: SharedBackend) -> Self {
        Self::new(
            ModeKind::FacialExpression,
            backend,
            &EXPRESSION_LABELS,
            None,
            LabelPolicy::FirstWithin {
                window: Duration::from_secs(5),
            },
        )
    }

    pub fn new(
        kind: ModeKind,
        backend: SharedBackend,
        labels: &'static [&'static str],
        fallback: Option<&'static str>,
        policy: LabelPolicy,
    ) -> Self {
        Self {
            kind,
            backend,
            labels,
            fallback,
            policy,
            gate: ActivityGate::new(),
            started_at: None,
            candidate: None,
            last_spoken_at: None,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    pub fn activate(&mut self, now: Instant) {
        self.gate.activate();
        self.started_at = Some(now);
        self.candidate = None;
        log::info!("{}: active", self.kind);
    }

    pub fn deactivate(&mut self) {
        self.gate.deactivate();
        self.started_at = None;
        self.candidate = None;
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    /// Map the strongest detection to its label.
    pub fn label_for(&self, detections: &[Detection]) -> Option<&'static str> {
        let best = detections
            .iter()
            .filter(|d| d.confidence.is_finite())
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))?;
        self.labels.get(best.class).copied().or(self.fallback)
    }

    pub fn on_frame(&mut self, frame: &Frame, now: Instant, announcer: &mut dyn Announcer) {
        let Some(ticket) = self.gate.try_begin(now) else {
            return;
        };
        let detections = match self.backend.lock() {
            Ok(mut backend) => backend.detect(frame),
            Err(_) => Err(anyhow!("backend lock poisoned")),
        };
        if !self.gate.finish(ticket) {
            return;
        }
        let detections = match detections {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("{}: classifier failed, skipping frame: {:#}", self.kind, e);
                return;
            }
        };
        let Some(label) = self.label_for(&detections) else {
            return;
        };

        match self.policy {
            LabelPolicy::Stable { hold, cooldown } => {
                match self.candidate {
                    Some((current, since)) if current == label => {
                        let held = now.saturating_duration_since(since) >= hold;
                        let cooled = self
                            .last_spoken_at
                            .map_or(true, |at| now.saturating_duration_since(at) >= cooldown);
                        if held && cooled {
                            announce(announcer, label);
                            self.last_spoken_at = Some(now);
                        }
                    }
                    _ => self.candidate = Some((label, now)),
                }
            }
            LabelPolicy::FirstWithin { .. } => {
                log::info!("{}: {}", self.kind, label);
                announce(announcer, label);
                self.deactivate();
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let LabelPolicy::FirstWithin { window } = self.policy {
            let expired = self
                .started_at
                .is_some_and(|at| now.saturating_duration_since(at) >= window);
            if expired {
                log::info!("{}: nothing recognised within {:?}", self.kind, window);
                self.deactivate();
            }
        }
    }
}
