use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use youreyes::detect::{ReplayBackend, ReplayFrame, SharedBackend};
use youreyes::{
    to_arabic_words, BoundingBox, ClassValueTable, Detection, DetectionCapability,
    MemoryAnnouncer, MoneyCounter, Resolution,
};

fn note(x: f32, confidence: f32, class: usize) -> Detection {
    Detection::new(BoundingBox::new(x, 0.0, 100.0, 50.0), confidence, class)
}

fn counter(frames: Vec<ReplayFrame>) -> MoneyCounter {
    let backend: SharedBackend = Arc::new(Mutex::new(ReplayBackend::new(
        DetectionCapability::Banknote,
        frames,
    )));
    MoneyCounter::new(
        backend,
        ClassValueTable::egyptian_pounds(),
        Duration::from_secs(3),
        0.3,
        Duration::from_secs(15),
    )
    .expect("money counter")
}

fn scripted(detections: Vec<Vec<Detection>>) -> Vec<ReplayFrame> {
    detections
        .into_iter()
        .map(|detections| ReplayFrame {
            detections,
            ..ReplayFrame::default()
        })
        .collect()
}

fn run_window(counter: &mut MoneyCounter, frames: usize) -> (Resolution, MemoryAnnouncer) {
    let frame = youreyes::Frame::new(Vec::new(), 0, 0);
    let mut announcer = MemoryAnnouncer::new();
    let t0 = Instant::now();
    counter.activate(t0);
    for i in 0..frames {
        let now = t0 + Duration::from_millis(200 * i as u64);
        assert!(counter.tick(now, &mut announcer).is_none());
        counter.on_frame(&frame, now);
    }
    let resolution = counter
        .tick(t0 + Duration::from_secs(3), &mut announcer)
        .expect("window closes");
    (resolution, announcer)
}

#[test]
fn five_and_twenty_pounds_total_twenty_five() {
    let frame = vec![note(0.0, 0.9, 0), note(300.0, 0.8, 2)];
    let mut counter = counter(scripted(vec![frame.clone(), frame.clone(), frame]));

    let (resolution, announcer) = run_window(&mut counter, 3);
    let Resolution::Counted(count) = &resolution else {
        panic!("expected a count");
    };
    assert_eq!(count.total, 25);
    assert_eq!(count.votes, 3);
    assert_eq!(count.frames, 3);

    let text = resolution.text();
    assert!(text.contains(&to_arabic_words(25)));
    assert!(text.contains(&to_arabic_words(5)));
    assert!(text.contains(&to_arabic_words(20)));
    assert_eq!(
        text,
        "المجموع عشرون وخمسة جنيه. فيه واحد خمسة فيه واحد عشرون"
    );
    assert_eq!(announcer.spoken(), &[text.to_string()]);
    assert!(!counter.is_active());
}

#[test]
fn duplicate_boxes_are_suppressed_before_counting() {
    let frame = vec![note(0.0, 0.9, 0), note(2.0, 0.6, 0), note(300.0, 0.8, 0)];
    let mut counter = counter(scripted(vec![frame]));

    let (resolution, _) = run_window(&mut counter, 1);
    let Resolution::Counted(count) = resolution else {
        panic!("expected a count");
    };
    assert_eq!(count.representative.count(0), 2);
    assert_eq!(count.total, 10);
}

#[test]
fn majority_signature_wins() {
    let a = vec![note(0.0, 0.9, 3)];
    let b = vec![note(0.0, 0.9, 4)];
    let mut counter = counter(scripted(vec![a.clone(), b, a]));

    let (resolution, _) = run_window(&mut counter, 3);
    let Resolution::Counted(count) = resolution else {
        panic!("expected a count");
    };
    assert_eq!(count.representative.signature().as_str(), "3:1");
    assert_eq!(count.total, 50);
    assert_eq!(count.votes, 2);
}

#[test]
fn empty_window_says_no_money() {
    let mut counter = counter(scripted(vec![Vec::new(), Vec::new()]));
    let (resolution, announcer) = run_window(&mut counter, 2);
    assert_eq!(resolution, Resolution::NothingDetected);
    assert_eq!(announcer.last(), Some("لا يوجد نقود"));
}

#[test]
fn failed_frames_are_skipped() {
    let mut frames = scripted(vec![vec![note(0.0, 0.9, 1)], vec![note(0.0, 0.9, 1)]]);
    frames.insert(
        1,
        ReplayFrame {
            fail: true,
            ..ReplayFrame::default()
        },
    );
    let mut counter = counter(frames);
    let (resolution, _) = run_window(&mut counter, 3);
    let Resolution::Counted(count) = resolution else {
        panic!("expected a count");
    };
    assert_eq!(count.frames, 2);
    assert_eq!(count.total, 10);
}

#[test]
fn reactivation_starts_an_empty_window() {
    let mut counter = counter(scripted(vec![vec![note(0.0, 0.9, 0)]]));
    let frame = youreyes::Frame::new(Vec::new(), 0, 0);
    let t0 = Instant::now();

    counter.activate(t0);
    counter.on_frame(&frame, t0);
    assert_eq!(counter.collected(), 1);

    counter.deactivate();
    counter.activate(t0 + Duration::from_secs(1));
    assert_eq!(counter.collected(), 0);
}

#[test]
fn stale_ticket_does_not_reach_new_window() {
    let mut counter = counter(Vec::new());
    let t0 = Instant::now();
    counter.activate(t0);
    let ticket = counter.begin_frame(t0).expect("gate free");
    assert!(counter.is_busy());

    counter.deactivate();
    assert!(!counter.is_busy());
    counter.activate(t0 + Duration::from_millis(100));

    counter.complete_frame(ticket, Ok(vec![note(0.0, 0.9, 0)]));
    assert_eq!(counter.collected(), 0);
    assert!(counter.begin_frame(t0 + Duration::from_millis(200)).is_some());
}

#[test]
fn timed_out_frame_releases_the_gate() {
    let backend: SharedBackend = Arc::new(Mutex::new(ReplayBackend::new(
        DetectionCapability::Banknote,
        Vec::new(),
    )));
    let mut counter = MoneyCounter::new(
        backend,
        ClassValueTable::egyptian_pounds(),
        Duration::from_secs(60),
        0.3,
        Duration::from_secs(15),
    )
    .expect("money counter");
    let mut announcer = MemoryAnnouncer::new();
    let t0 = Instant::now();

    counter.activate(t0);
    let ticket = counter.begin_frame(t0).expect("gate free");
    assert!(counter.tick(t0 + Duration::from_secs(16), &mut announcer).is_none());
    assert!(!counter.is_busy());

    counter.complete_frame(ticket, Ok(vec![note(0.0, 0.9, 0)]));
    assert_eq!(counter.collected(), 0);
    assert!(counter.is_active());
}
