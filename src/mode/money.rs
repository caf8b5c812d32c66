use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::announce::{announce, Announcer};
use crate::detect::{
    non_max_suppression, Detection, DetectionCapability, SharedBackend, DEFAULT_CONFIDENCE_FLOOR,
};
use crate::frame::Frame;
use crate::tally::FrameTally;
use crate::values::ClassValueTable;
use crate::window::{Resolution, WindowAggregator};

use super::gate::{ActivityGate, Ticket};

/// Money counting mode: detect banknotes over a timed window, then speak the total.
pub struct MoneyCounter {
    backend: SharedBackend,
    aggregator: WindowAggregator,
    gate: ActivityGate,
    iou_threshold: f32,
    confidence_floor: f32,
    request_timeout: Duration,
}

impl MoneyCounter {
    pub fn new(
        backend: SharedBackend,
        table: ClassValueTable,
        window: Duration,
        iou_threshold: f32,
        request_timeout: Duration,
    ) -> Result<Self> {
        {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            if !guard.supports(DetectionCapability::Banknote) {
                return Err(anyhow!("money counter requires a banknote-capable backend"));
            }
            guard
                .warm_up()
                .with_context(|| format!("{} backend warm-up failed", guard.name()))?;
        }
        Ok(Self {
            backend,
            aggregator: WindowAggregator::new(window, table),
            gate: ActivityGate::new(),
            iou_threshold,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            request_timeout,
        })
    }

    /// Override the minimum confidence a detection needs to be counted.
    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn activate(&mut self, now: Instant) {
        log::info!(
            "money: collecting for {:.1}s",
            self.aggregator.duration().as_secs_f32()
        );
        self.gate.activate();
        self.aggregator.activate(now);
    }

    pub fn deactivate(&mut self) {
        if self.is_active() {
            log::info!("money: deactivated with {} tallies dropped", self.collected());
        }
        self.gate.deactivate();
        self.aggregator.deactivate();
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_active()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Tallies collected in the current window.
    pub fn collected(&self) -> usize {
        self.aggregator.collected()
    }

    /// Acquire the busy gate for an asynchronous detector call.
    pub fn begin_frame(&mut self, now: Instant) -> Option<Ticket> {
        self.gate.try_begin(now)
    }

    /// Finish a frame started with [`begin_frame`](Self::begin_frame).
    ///
    /// Stale tickets and detector failures are dropped; the frame is not retried.
    pub fn complete_frame(&mut self, ticket: Ticket, detections: Result<Vec<Detection>>) {
        if !self.gate.finish(ticket) {
            log::debug!("money: dropping result for stale frame");
            return;
        }
        let detections = match detections {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("money: detector failed, skipping frame: {:#}", e);
                return;
            }
        };
        let raw = detections.len();
        let confident: Vec<Detection> = detections
            .into_iter()
            .filter(|d| d.confidence >= self.confidence_floor)
            .collect();
        let kept = non_max_suppression(confident, self.iou_threshold);
        let tally = FrameTally::from_detections(&kept, self.aggregator.table());
        log::debug!(
            "money: frame raw={} kept={} signature={}",
            raw,
            kept.len(),
            tally.signature()
        );
        self.aggregator.offer(tally);
    }

    /// Run the detector synchronously on `frame` if the gate is free.
    pub fn on_frame(&mut self, frame: &Frame, now: Instant) {
        let Some(ticket) = self.begin_frame(now) else {
            return;
        };
        let detections = match self.backend.lock() {
            Ok(mut backend) => backend.detect(frame),
            Err(_) => Err(anyhow!("backend lock poisoned")),
        };
        self.complete_frame(ticket, detections);
    }

    /// Advance time; speaks and returns the result when the window closes.
    pub fn tick(&mut self, now: Instant, announcer: &mut dyn Announcer) -> Option<Resolution> {
        if self.gate.expire(now, self.request_timeout) {
            log::warn!("money: detector call timed out, skipping frame");
        }
        let resolution = self.aggregator.tick(now)?;
        match &resolution {
            Resolution::NothingDetected => log::info!("money: window closed, nothing detected"),
            Resolution::Counted(count) => log::info!(
                "money: total={} votes={}/{} signature={}",
                count.total,
                count.votes,
                count.frames,
                count.representative.signature()
            ),
        }
        announce(announcer, resolution.text());
        self.gate.deactivate();
        Some(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::MemoryAnnouncer;
    use crate::detect::{BoundingBox, ReplayBackend, StubBackend};
    use crate::window::DEFAULT_WINDOW;
    use std::sync::{Arc, Mutex};

    fn note(x: f32, conf: f32, class: usize) -> Detection {
        Detection::new(BoundingBox::new(x, 0.0, 50.0, 30.0), conf, class)
    }

    fn counter(backend: ReplayBackend) -> MoneyCounter {
        MoneyCounter::new(
            Arc::new(Mutex::new(backend)),
            ClassValueTable::default(),
            DEFAULT_WINDOW,
            0.3,
            Duration::from_secs(15),
        )
        .unwrap()
    }

    fn blank() -> Frame {
        Frame::new(Vec::new(), 0, 0)
    }

    #[test]
    fn rejects_backend_without_banknote_capability() {
        let backend = ReplayBackend::new(DetectionCapability::Text, Vec::new());
        let result = MoneyCounter::new(
            Arc::new(Mutex::new(backend)),
            ClassValueTable::default(),
            DEFAULT_WINDOW,
            0.3,
            Duration::from_secs(15),
        );
        assert!(result.is_err());
    }

    #[test]
    fn counts_notes_and_speaks_total() {
        let dets = vec![note(0.0, 0.9, 0), note(5.0, 0.6, 0), note(200.0, 0.8, 2)];
        let mut money = counter(ReplayBackend::repeating(DetectionCapability::Banknote, dets, 3));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();

        money.activate(start);
        for i in 0..3 {
            money.on_frame(&blank(), start + Duration::from_millis(100 * i));
        }
        assert_eq!(money.collected(), 3);

        let Some(Resolution::Counted(count)) = money.tick(start + DEFAULT_WINDOW, &mut announcer)
        else {
            panic!("expected a count");
        };
        assert_eq!(count.total, 25);
        assert_eq!(announcer.last(), Some(count.summary.as_str()));
        assert!(!money.is_active());
    }

    #[test]
    fn frames_are_ignored_while_inactive() {
        let shared: SharedBackend = Arc::new(Mutex::new(StubBackend::new()));
        let mut money = MoneyCounter::new(
            shared,
            ClassValueTable::default(),
            DEFAULT_WINDOW,
            0.3,
            Duration::from_secs(15),
        )
        .unwrap();
        money.on_frame(&blank(), Instant::now());
        assert_eq!(money.collected(), 0);
        assert!(money.begin_frame(Instant::now()).is_none());
    }

    #[test]
    fn failed_frames_are_skipped() {
        let raw = r#"{"frames": [{"fail": true}, {"detections": [{"x": 0, "y": 0, "w": 5, "h": 5, "confidence": 0.9, "class": 1}]}]}"#;
        let backend = ReplayBackend::from_json_str(DetectionCapability::Banknote, raw).unwrap();
        let mut money = counter(backend);
        let start = Instant::now();
        money.activate(start);
        money.on_frame(&blank(), start);
        assert_eq!(money.collected(), 0);
        assert!(!money.is_busy());
        money.on_frame(&blank(), start);
        assert_eq!(money.collected(), 1);
    }

    #[test]
    fn detections_below_floor_are_not_counted() {
        let mut money = counter(ReplayBackend::new(DetectionCapability::Banknote, Vec::new()))
            .with_confidence_floor(0.5);
        let start = Instant::now();
        money.activate(start);

        let ticket = money.begin_frame(start).unwrap();
        money.complete_frame(ticket, Ok(vec![note(0.0, 0.3, 0)]));
        assert_eq!(money.collected(), 0);

        let ticket = money.begin_frame(start).unwrap();
        money.complete_frame(ticket, Ok(vec![note(0.0, 0.3, 0), note(200.0, 0.7, 1)]));
        let window = money.aggregator.window().unwrap();
        assert_eq!(window.entries()[0].signature().as_str(), "1:1");
    }

    #[test]
    fn late_result_after_deactivation_is_ignored() {
        let mut money = counter(ReplayBackend::new(DetectionCapability::Banknote, Vec::new()));
        let start = Instant::now();
        money.activate(start);
        let ticket = money.begin_frame(start).unwrap();
        money.deactivate();
        money.activate(start + Duration::from_secs(1));
        money.complete_frame(ticket, Ok(vec![note(0.0, 0.9, 3)]));
        assert_eq!(money.collected(), 0);
        assert!(money.begin_frame(start + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn timed_out_frame_releases_gate() {
        let mut money = counter(ReplayBackend::new(DetectionCapability::Banknote, Vec::new()));
        let mut announcer = MemoryAnnouncer::new();
        let start = Instant::now();
        money.activate(start);
        let _ticket = money.begin_frame(start).unwrap();
        assert!(money.tick(start + Duration::from_secs(1), &mut announcer).is_none());
        assert!(money.is_busy());
        let resolution = money.tick(start + Duration::from_secs(15), &mut announcer);
        assert_eq!(resolution, Some(Resolution::NothingDetected));
        assert_eq!(announcer.last(), Some("لا يوجد نقود"));
    }
}
