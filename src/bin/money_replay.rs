//! money_replay - run a scripted detection replay through the money counter

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use youreyes::detect::{DetectionCapability, ReplayBackend, SharedBackend};
use youreyes::{Announcer, Frame, LogAnnouncer, MoneyCounter, Resolution, YourEyesConfig};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Replay script: {"frames": [{"at_ms": 0, "detections": [...]}, ...]}.
    #[arg(value_name = "PATH")]
    replay: PathBuf,
    /// Override the collection window, in seconds.
    #[arg(long)]
    window_secs: Option<f32>,
    /// Override the NMS IoU threshold.
    #[arg(long)]
    iou_threshold: Option<f32>,
    /// Print the vote breakdown as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = YourEyesConfig::load()?;
    if let Some(seconds) = args.window_secs {
        cfg.money.window = Duration::try_from_secs_f32(seconds)
            .map_err(|_| anyhow!("--window-secs must be a positive number"))?;
    }
    if let Some(threshold) = args.iou_threshold {
        cfg.money.iou_threshold = threshold;
    }

    let replay = ReplayBackend::from_json_file(DetectionCapability::Banknote, &args.replay)?;
    let offsets = replay.offsets_ms();
    log::info!("replaying {} frames from {}", offsets.len(), args.replay.display());
    let backend: SharedBackend = Arc::new(Mutex::new(replay));

    let mut counter = MoneyCounter::new(
        backend,
        cfg.money.class_table()?,
        cfg.money.window,
        cfg.money.iou_threshold,
        cfg.request_timeout,
    )?
    .with_confidence_floor(cfg.money.confidence_floor);
    let mut announcer = build_announcer(&cfg)?;
    let frame = Frame::new(Vec::new(), 0, 0);

    let t0 = Instant::now();
    counter.activate(t0);
    let mut resolution = None;
    for offset in offsets {
        let now = t0 + Duration::from_millis(offset);
        if let Some(done) = counter.tick(now, announcer.as_mut()) {
            resolution = Some(done);
            break;
        }
        counter.on_frame(&frame, now);
    }
    let resolution = match resolution {
        Some(done) => done,
        None => counter
            .tick(t0 + cfg.money.window, announcer.as_mut())
            .ok_or_else(|| anyhow!("collection window did not close"))?,
    };

    if args.json {
        let report = match &resolution {
            Resolution::NothingDetected => serde_json::json!({
                "text": resolution.text(),
                "total": 0,
            }),
            Resolution::Counted(count) => serde_json::json!({
                "text": resolution.text(),
                "total": count.total,
                "votes": count.votes,
                "frames": count.frames,
                "signature": count.representative.signature().to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", resolution.text());
    }
    Ok(())
}

#[cfg(feature = "announce-http")]
fn build_announcer(cfg: &YourEyesConfig) -> Result<Box<dyn Announcer>> {
    match cfg.tts_url.as_deref() {
        Some(url) => Ok(Box::new(youreyes::HttpAnnouncer::new(url, cfg.request_timeout)?)),
        None => Ok(Box::new(LogAnnouncer)),
    }
}

#[cfg(not(feature = "announce-http"))]
fn build_announcer(cfg: &YourEyesConfig) -> Result<Box<dyn Announcer>> {
    if cfg.tts_url.is_some() {
        log::warn!("YOUREYES_TTS_URL set but built without announce-http; logging instead");
    }
    Ok(Box::new(LogAnnouncer))
}
