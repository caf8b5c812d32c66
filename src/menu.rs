//! Tap-driven mode selection.
//!
//! A double tap (two taps inside the tap window) enters selection on the first mode,
//! and each further double tap moves to the next one. A single tap, confirmed once
//! the tap window passes without a second tap, selects the highlighted mode.

use std::time::{Duration, Instant};

use crate::mode::ModeKind;

pub const DEFAULT_TAP_WINDOW: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuEvent {
    /// The highlighted mode changed; its name should be spoken.
    Highlight(ModeKind),
    /// The highlighted mode was chosen.
    Confirm(ModeKind),
}

#[derive(Debug)]
pub struct MenuSelector {
    tap_window: Duration,
    tap_count: u32,
    last_tap: Option<Instant>,
    pending_single: Option<Instant>,
    selecting: bool,
    index: usize,
    modes: Vec<ModeKind>,
}

impl MenuSelector {
    pub fn new(tap_window: Duration) -> Self {
        Self {
            tap_window,
            tap_count: 0,
            last_tap: None,
            pending_single: None,
            selecting: false,
            index: 0,
            modes: ModeKind::ALL.to_vec(),
        }
    }

    /// Restrict the menu to `modes`, in the given order.
    pub fn with_modes(mut self, modes: Vec<ModeKind>) -> Self {
        self.modes = modes;
        self.index = 0;
        self
    }

    pub fn modes(&self) -> &[ModeKind] {
        &self.modes
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting
    }

    pub fn highlighted(&self) -> Option<ModeKind> {
        if self.selecting {
            self.modes.get(self.index).copied()
        } else {
            None
        }
    }

    pub fn tap(&mut self, now: Instant) -> Option<MenuEvent> {
        let within = self
            .last_tap
            .is_some_and(|last| now.saturating_duration_since(last) < self.tap_window);
        self.tap_count = if within { self.tap_count + 1 } else { 1 };
        self.last_tap = Some(now);
        log::debug!("menu: tap #{}", self.tap_count);

        if self.tap_count == 1 {
            self.pending_single = Some(now);
            return None;
        }

        self.pending_single = None;
        self.tap_count = 0;
        if self.modes.is_empty() {
            return None;
        }
        if self.selecting {
            self.index = (self.index + 1) % self.modes.len();
        } else {
            self.selecting = true;
            self.index = 0;
        }
        Some(MenuEvent::Highlight(self.modes[self.index]))
    }

    /// Confirms a pending single tap once the tap window has passed.
    pub fn tick(&mut self, now: Instant) -> Option<MenuEvent> {
        let since = self.pending_single?;
        if now.saturating_duration_since(since) < self.tap_window {
            return None;
        }
        self.pending_single = None;
        self.tap_count = 0;
        if !self.selecting {
            return None;
        }
        self.selecting = false;
        self.modes.get(self.index).copied().map(MenuEvent::Confirm)
    }
}

impl Default for MenuSelector {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    #[test]
    fn single_tap_outside_selection_does_nothing() {
        let t0 = Instant::now();
        let mut menu = MenuSelector::default();
        assert_eq!(menu.tap(t0), None);
        assert_eq!(menu.tick(ms(t0, 2000)), None);
        assert!(!menu.is_selecting());
    }

    #[test]
    fn double_tap_enters_then_cycles() {
        let t0 = Instant::now();
        let mut menu = MenuSelector::default();
        menu.tap(t0);
        assert_eq!(menu.tap(ms(t0, 300)), Some(MenuEvent::Highlight(ModeKind::Distance)));
        menu.tap(ms(t0, 3000));
        assert_eq!(menu.tap(ms(t0, 3200)), Some(MenuEvent::Highlight(ModeKind::Money)));
        assert_eq!(menu.highlighted(), Some(ModeKind::Money));
    }

    #[test]
    fn single_tap_confirms_after_window() {
        let t0 = Instant::now();
        let mut menu = MenuSelector::default();
        menu.tap(t0);
        menu.tap(ms(t0, 200));
        menu.tap(ms(t0, 2500));
        menu.tap(ms(t0, 2700));
        assert_eq!(menu.highlighted(), Some(ModeKind::Money));

        assert_eq!(menu.tap(ms(t0, 5000)), None);
        assert_eq!(menu.tick(ms(t0, 6000)), None);
        assert_eq!(menu.tick(ms(t0, 7000)), Some(MenuEvent::Confirm(ModeKind::Money)));
        assert!(!menu.is_selecting());
        assert_eq!(menu.tick(ms(t0, 9000)), None);
    }

    #[test]
    fn cycling_wraps_around() {
        let t0 = Instant::now();
        let mut menu = MenuSelector::default();
        let mut last = None;
        for i in 0..8u64 {
            menu.tap(ms(t0, i * 5000));
            last = menu.tap(ms(t0, i * 5000 + 100));
        }
        assert_eq!(last, Some(MenuEvent::Highlight(ModeKind::Distance)));
    }

    #[test]
    fn cycles_only_through_listed_modes() {
        let t0 = Instant::now();
        let mut menu =
            MenuSelector::default().with_modes(vec![ModeKind::Distance, ModeKind::Money]);
        menu.tap(t0);
        menu.tap(ms(t0, 100));
        menu.tap(ms(t0, 3000));
        assert_eq!(menu.tap(ms(t0, 3100)), Some(MenuEvent::Highlight(ModeKind::Money)));
        menu.tap(ms(t0, 6000));
        assert_eq!(menu.tap(ms(t0, 6100)), Some(MenuEvent::Highlight(ModeKind::Distance)));
    }

    #[test]
    fn empty_menu_never_enters_selection() {
        let t0 = Instant::now();
        let mut menu = MenuSelector::default().with_modes(Vec::new());
        menu.tap(t0);
        assert_eq!(menu.tap(ms(t0, 100)), None);
        assert!(!menu.is_selecting());
    }
}
