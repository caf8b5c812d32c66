//! Announcer seam: where rendered text leaves the crate to be spoken.
//!
//! Speaking is fire-and-forget from the caller's point of view. Callers log
//! announcer failures and carry on.

use anyhow::Result;

#[cfg(feature = "announce-http")]
use anyhow::{anyhow, Context};
#[cfg(feature = "announce-http")]
use std::time::Duration;

/// Speaks text to the user.
pub trait Announcer {
    fn speak(&mut self, text: &str) -> Result<()>;
}

impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn speak(&mut self, text: &str) -> Result<()> {
        (**self).speak(text)
    }
}

/// Speak and log failures instead of propagating them.
pub fn announce(announcer: &mut dyn Announcer, text: &str) {
    if let Err(e) = announcer.speak(text) {
        log::error!("announcement failed: {:#}", e);
    }
}

/// Writes announcements to the log. Useful headless and in replays.
#[derive(Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn speak(&mut self, text: &str) -> Result<()> {
        log::info!("speak: {}", text);
        Ok(())
    }
}

/// Records announcements in memory.
#[derive(Default, Debug)]
pub struct MemoryAnnouncer {
    spoken: Vec<String>,
}

impl MemoryAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }

    pub fn last(&self) -> Option<&str> {
        self.spoken.last().map(String::as_str)
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.spoken)
    }
}

impl Announcer for MemoryAnnouncer {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.push(text.to_string());
        Ok(())
    }
}

/// Posts `{"text": ...}` to a remote TTS service at `{base_url}/tts`.
///
/// The synthesized audio in the response is discarded; playback belongs to the host.
#[cfg(feature = "announce-http")]
pub struct HttpAnnouncer {
    endpoint: String,
    agent: ureq::Agent,
}

#[cfg(feature = "announce-http")]
impl HttpAnnouncer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("invalid TTS service url {}", base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("TTS service url must be http(s): {}", base_url));
        }
        let endpoint = format!("{}/tts", base_url.trim_end_matches('/'));
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { endpoint, agent })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(feature = "announce-http")]
impl Announcer for HttpAnnouncer {
    fn speak(&mut self, text: &str) -> Result<()> {
        let body = serde_json::json!({ "text": text });
        self.agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .with_context(|| format!("TTS request to {} failed", self.endpoint))?;
        Ok(())
    }
}
