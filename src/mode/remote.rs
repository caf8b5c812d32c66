use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::announce::{announce, Announcer};

use super::gate::{ActivityGate, Ticket};
use super::ModeKind;

/// A mode whose answer comes from a remote describer service (LLM-backed).
///
/// The host encodes the frame and performs the request; this type only owns the
/// gated, cancellable lifecycle. The first non-empty reply is spoken and the mode
/// goes idle until reactivated.
pub struct RemoteMode {
    kind: ModeKind,
    gate: ActivityGate,
    activated_at: Option<Instant>,
    warm_up: Duration,
    request_timeout: Duration,
}

impl RemoteMode {
    pub fn new(kind: ModeKind, request_timeout: Duration) -> Self {
        let warm_up = match kind {
            ModeKind::SceneDescription => Duration::from_secs(1),
            _ => Duration::ZERO,
        };
        Self {
            kind,
            gate: ActivityGate::new(),
            activated_at: None,
            warm_up,
            request_timeout,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    /// Service route for this mode's requests.
    pub fn route(&self) -> &'static str {
        match self.kind {
            ModeKind::Clothes => "/clothes",
            _ => "/describe",
        }
    }

    pub fn activate(&mut self, now: Instant, announcer: &mut dyn Announcer) {
        if let Some(notice) = self.kind.activation_notice() {
            announce(announcer, notice);
        }
        self.gate.activate();
        self.activated_at = Some(now);
        log::info!("{}: waiting for a frame", self.kind);
    }

    pub fn deactivate(&mut self) {
        self.gate.deactivate();
        self.activated_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Acquire the gate for a request once the warm-up delay has passed.
    pub fn begin_request(&mut self, now: Instant) -> Option<Ticket> {
        let ready = self
            .activated_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.warm_up);
        if !ready {
            return None;
        }
        self.gate.try_begin(now)
    }

    /// Deliver the service reply. Returns true when it was spoken.
    ///
    /// Failed or empty replies skip the frame; the mode stays active for the next one.
    pub fn complete_request(
        &mut self,
        ticket: Ticket,
        reply: Result<String>,
        announcer: &mut dyn Announcer,
    ) -> bool {
        if !self.gate.finish(ticket) {
            log::debug!("{}: dropping late reply", self.kind);
            return false;
        }
        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                log::warn!("{}: request failed, skipping frame: {:#}", self.kind, e);
                return false;
            }
        };
        let text = text.trim();
        if text.is_empty() {
            log::warn!("{}: empty reply, skipping frame", self.kind);
            return false;
        }
        announce(announcer, text);
        self.deactivate();
        true
    }

    pub fn tick(&mut self, now: Instant) {
        if self.gate.expire(now, self.request_timeout) {
            log::warn!("{}: request timed out, skipping frame", self.kind);
        }
    }

    /// Extract the spoken text from a service reply body.
    ///
    /// `Ok(None)` means the frame is skipped and the mode stays active: the clothes
    /// service answers `BAD` for unusable frames, and blank text is never spoken.
    pub fn parse_reply(&self, body: &str) -> Result<Option<String>> {
        let text = match self.kind {
            ModeKind::Clothes => return parse_clothes_reply(body),
            _ => {
                let reply: CaptionReply = serde_json::from_str(body)
                    .with_context(|| format!("{}: invalid reply", self.kind))?;
                reply.caption
            }
        };
        Ok(text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }
}

const SKIP_FRAME: &str = "BAD";

#[derive(Debug, Default, Deserialize)]
struct CaptionReply {
    caption: Option<String>,
}

/// `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
#[derive(Debug, Default, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClothesSummary {
    summary_egyptian_arabic: Option<String>,
}

fn parse_clothes_reply(body: &str) -> Result<Option<String>> {
    let body = body.trim();
    if body.eq_ignore_ascii_case(SKIP_FRAME) {
        return Ok(None);
    }
    let reply: GenerateReply =
        serde_json::from_str(body).context("clothes: invalid reply envelope")?;
    let text = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow!("clothes: reply carried no text"))?;
    if text.eq_ignore_ascii_case(SKIP_FRAME) {
        return Ok(None);
    }

    // The model wraps its JSON answer in prose or code fences.
    let object = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.as_str(),
    };
    let summary: ClothesSummary =
        serde_json::from_str(object).context("clothes: invalid summary object")?;
    Ok(summary
        .summary_egyptian_arabic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}
