//! Timed collection window with plurality vote over tally signatures.
//!
//! The window and the vote are generic so other timed modes (text reading) can
//! collect their own per-frame results.
//!
//! States: IDLE -> COLLECTING -> (duration elapsed on a tick) -> resolve -> IDLE.
//! There is no timer: the host drives `tick` once per frame.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::summary::{render_money_summary, NO_MONEY_TEXT};
use crate::tally::FrameTally;
use crate::values::ClassValueTable;

/// Default collection window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3);

/// Append-only sequence of per-frame results gathered since activation.
#[derive(Debug)]
pub struct CollectionWindow<T = FrameTally> {
    started_at: Instant,
    duration: Duration,
    entries: Vec<T>,
}

impl<T> CollectionWindow<T> {
    pub(crate) fn new(started_at: Instant, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub(crate) fn into_entries(self) -> Vec<T> {
        self.entries
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_elapsed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }
}

/// Outcome of a closed window.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    NothingDetected,
    Counted(Count),
}

/// The winning tally and its rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Count {
    pub representative: FrameTally,
    pub total: u64,
    /// Members of the winning signature group.
    pub votes: usize,
    /// Tallies collected in the window.
    pub frames: usize,
    pub summary: String,
}

impl Resolution {
    /// Text to announce for this outcome.
    pub fn text(&self) -> &str {
        match self {
            Resolution::NothingDetected => NO_MONEY_TEXT,
            Resolution::Counted(count) => &count.summary,
        }
    }
}

#[derive(Debug)]
enum WindowState {
    Idle,
    Collecting(CollectionWindow),
}

/// Collects per-frame tallies for a fixed window and resolves them to one result.
pub struct WindowAggregator {
    duration: Duration,
    table: ClassValueTable,
    state: WindowState,
}

impl WindowAggregator {
    pub fn new(duration: Duration, table: ClassValueTable) -> Self {
        Self {
            duration,
            table,
            state: WindowState::Idle,
        }
    }

    pub fn table(&self) -> &ClassValueTable {
        &self.table
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start a fresh window. A window already collecting is discarded.
    pub fn activate(&mut self, now: Instant) {
        self.state = WindowState::Collecting(CollectionWindow::new(now, self.duration));
    }

    /// Drop the current window without resolving it.
    pub fn deactivate(&mut self) {
        self.state = WindowState::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, WindowState::Collecting(_))
    }

    pub fn window(&self) -> Option<&CollectionWindow> {
        match &self.state {
            WindowState::Collecting(window) => Some(window),
            WindowState::Idle => None,
        }
    }

    /// Number of tallies in the active window (0 when idle).
    pub fn collected(&self) -> usize {
        self.window().map_or(0, CollectionWindow::len)
    }

    /// Append a tally. Ignored when idle or when the tally is empty.
    pub fn offer(&mut self, tally: FrameTally) -> bool {
        match &mut self.state {
            WindowState::Collecting(window) if !tally.is_empty() => {
                window.push(tally);
                true
            }
            _ => false,
        }
    }

    /// Advance time. Returns the resolution when the window closes on this tick.
    pub fn tick(&mut self, now: Instant) -> Option<Resolution> {
        let elapsed = self.window().is_some_and(|window| window.has_elapsed(now));
        if !elapsed {
            return None;
        }
        match std::mem::replace(&mut self.state, WindowState::Idle) {
            WindowState::Collecting(window) => Some(self.resolve(window)),
            WindowState::Idle => None,
        }
    }

    fn resolve(&self, window: CollectionWindow) -> Resolution {
        let frames = window.len();
        let Some((index, votes)) = plurality_index(window.entries()) else {
            return Resolution::NothingDetected;
        };
        let mut tallies = window.into_entries();
        let representative = tallies.swap_remove(index);
        let total = representative.total_value(&self.table);
        let summary = render_money_summary(&representative, &self.table);
        Resolution::Counted(Count {
            representative,
            total,
            votes,
            frames,
            summary,
        })
    }
}

/// Pick the representative tally by plurality over signatures.
///
/// Returns the index of the first member of the largest group and the group size.
/// Groups of equal size are ranked by the position of their first member, so the
/// earliest-seen signature wins ties.
pub fn plurality_index(tallies: &[FrameTally]) -> Option<(usize, usize)> {
    plurality_by(tallies, FrameTally::signature)
}

/// Plurality vote over `items` grouped by `key`, earliest-seen group winning ties.
pub fn plurality_by<T, K, F>(items: &[T], key: F) -> Option<(usize, usize)>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    // key -> slot in `groups`; groups hold (first index, votes) in first-seen order
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(usize, usize)> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match slots.entry(key(item)) {
            Entry::Occupied(slot) => groups[*slot.get()].1 += 1,
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push((index, 1));
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for group in groups {
        if best.map_or(true, |(_, votes)| group.1 > votes) {
            best = Some(group);
        }
    }
    best
}
