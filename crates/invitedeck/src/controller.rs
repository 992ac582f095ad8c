//! Slide navigation state machine.
//!
//! The controller owns the current slide index and the playback flags. Time is
//! passed in explicitly so the viewer loop, the headless exporters and the tests
//! all drive the same machine.

use std::time::{Duration, Instant};

pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_secs(7);
pub const WHEEL_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Map a wheel/scroll delta to a direction; positive means "towards the next slide".
    pub fn from_delta(delta: f32) -> Option<Self> {
        if delta > 0.0 {
            Some(Self::Forward)
        } else if delta < 0.0 {
            Some(Self::Backward)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub autoplay: bool,
    pub gate_opened: bool,
    pub exporting: bool,
}

/// Drops wheel events that arrive within `window` of the last accepted one.
///
/// Only a timestamp is kept, so there is no scheduled callback to cancel when the
/// owner goes away.
#[derive(Debug, Clone)]
pub struct WheelDebounce {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl WheelDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

#[derive(Debug, Clone)]
pub struct SlideController {
    index: usize,
    total: usize,
    state: PlaybackState,
    interval: Duration,
    /// The single armed autoplay deadline, if any.
    next_tick: Option<Instant>,
    wheel: WheelDebounce,
}

impl SlideController {
    /// A controller over `total` slides (at least one), gate closed.
    pub fn new(total: usize, interval: Duration, autoplay: bool) -> Self {
        Self {
            index: 0,
            total: total.max(1),
            state: PlaybackState {
                autoplay,
                gate_opened: false,
                exporting: false,
            },
            interval,
            next_tick: None,
            wheel: WheelDebounce::new(WHEEL_DEBOUNCE),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_exporting(&self) -> bool {
        self.state.exporting
    }

    /// When the armed autoplay tick is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Move one slide in `direction`, wrapping at both ends.
    ///
    /// Inert until the gate has opened. Returns whether the index changed.
    pub fn advance(&mut self, direction: Direction, now: Instant) -> bool {
        if !self.state.gate_opened {
            return false;
        }
        self.index = match direction {
            Direction::Forward => (self.index + 1) % self.total,
            Direction::Backward => (self.index + self.total - 1) % self.total,
        };
        tracing::debug!(index = self.index, ?direction, "advanced slide");
        self.rearm(now);
        true
    }

    /// A direct user navigation: advances and pauses autoplay.
    pub fn navigate(&mut self, direction: Direction, now: Instant) -> bool {
        if self.state.exporting || !self.state.gate_opened {
            return false;
        }
        self.state.autoplay = false;
        self.advance(direction, now)
    }

    pub fn set_autoplay(&mut self, on: bool, now: Instant) {
        if self.state.autoplay == on {
            return;
        }
        self.state.autoplay = on;
        tracing::debug!(autoplay = on, "autoplay changed");
        self.rearm(now);
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        self.set_autoplay(!self.state.autoplay, now);
    }

    /// One-shot transition fired when the entrance animation completes.
    pub fn open_gate(&mut self, now: Instant) -> bool {
        if self.state.gate_opened {
            return false;
        }
        self.state.gate_opened = true;
        tracing::debug!("gate opened");
        self.rearm(now);
        true
    }

    /// Fire the autoplay tick if it is due. Returns whether the slide advanced.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(deadline) if now >= deadline => self.advance(Direction::Forward, now),
            _ => false,
        }
    }

    /// Debounced wheel input. `delta > 0` moves forward.
    pub fn on_wheel(&mut self, delta: f32, now: Instant) -> bool {
        if self.state.exporting {
            return false;
        }
        let Some(direction) = Direction::from_delta(delta) else {
            return false;
        };
        if !self.wheel.accept(now) {
            return false;
        }
        self.advance(direction, now)
    }

    /// Scripted positioning, used while recording.
    pub fn jump_to(&mut self, index: usize, now: Instant) {
        let index = index % self.total;
        if index != self.index {
            self.index = index;
            self.rearm(now);
        }
    }

    /// Enter the exporting state, suspending autoplay.
    ///
    /// Returns `false` without touching anything if an export is already running.
    pub fn begin_export(&mut self) -> bool {
        if self.state.exporting {
            return false;
        }
        self.state.exporting = true;
        self.state.autoplay = false;
        self.next_tick = None;
        true
    }

    /// Leave the exporting state. Autoplay stays off until the user resumes it.
    pub fn end_export(&mut self, now: Instant) {
        self.state.exporting = false;
        self.rearm(now);
    }

    /// Cancel the previous deadline and schedule exactly one new tick if the
    /// current state still calls for autoplay.
    fn rearm(&mut self, now: Instant) {
        let s = self.state;
        self.next_tick = (s.autoplay && s.gate_opened && !s.exporting).then(|| now + self.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn opened(total: usize, autoplay: bool) -> (SlideController, Instant) {
        let start = Instant::now();
        let mut c = SlideController::new(total, DEFAULT_AUTOPLAY_INTERVAL, autoplay);
        c.open_gate(start);
        (c, start)
    }

    /// Step a simulated clock in 100ms increments, returning how many ticks advanced.
    fn run_for(c: &mut SlideController, from: Instant, span: Duration) -> usize {
        let step = Duration::from_millis(100);
        let mut fired = 0;
        let mut t = from;
        while t <= from + span {
            if c.tick(t) {
                fired += 1;
            }
            t += step;
        }
        fired
    }

    #[test]
    fn advance_wraps_at_both_ends() {
        let (mut c, now) = opened(4, false);
        assert_eq!(c.index(), 0);
        c.advance(Direction::Backward, now);
        assert_eq!(c.index(), 3);
        c.advance(Direction::Forward, now);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn advance_stays_in_range_for_every_index() {
        let (mut c, now) = opened(5, false);
        for _ in 0..12 {
            let before = c.index();
            c.advance(Direction::Forward, now);
            assert_eq!(c.index(), (before + 1) % 5);
        }
        for _ in 0..12 {
            let before = c.index();
            c.advance(Direction::Backward, now);
            assert_eq!(c.index(), (before + 5 - 1) % 5);
        }
    }

    #[test]
    fn end_to_end_wrap_from_two() {
        let (mut c, now) = opened(4, false);
        c.jump_to(2, now);
        c.advance(Direction::Forward, now);
        assert_eq!(c.index(), 3);
        c.advance(Direction::Forward, now);
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn navigation_is_inert_before_gate_opens() {
        let now = Instant::now();
        let mut c = SlideController::new(4, DEFAULT_AUTOPLAY_INTERVAL, true);
        assert!(!c.advance(Direction::Forward, now));
        assert!(!c.navigate(Direction::Backward, now));
        assert!(!c.on_wheel(10.0, now));
        assert_eq!(run_for(&mut c, now, 30 * SECOND), 0);
        assert_eq!(c.index(), 0);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn open_gate_is_one_shot() {
        let now = Instant::now();
        let mut c = SlideController::new(4, DEFAULT_AUTOPLAY_INTERVAL, true);
        assert!(c.open_gate(now));
        assert!(c.state().gate_opened);
        assert!(!c.open_gate(now + SECOND));
        assert!(c.state().gate_opened);
        // The second call must not push the deadline back.
        assert_eq!(c.next_deadline(), Some(now + DEFAULT_AUTOPLAY_INTERVAL));
    }

    #[test]
    fn autoplay_ticks_once_per_interval() {
        let (mut c, start) = opened(4, true);
        let fired = run_for(&mut c, start, 21 * SECOND);
        assert_eq!(fired, 3);
        assert_eq!(c.index(), 3);
    }

    #[test]
    fn toggling_autoplay_never_stacks_timers() {
        let (mut c, start) = opened(10, true);
        // Off and on again half way through the period.
        let mid = start + Duration::from_millis(3500);
        c.set_autoplay(false, mid);
        assert!(c.next_deadline().is_none());
        c.set_autoplay(true, mid);
        assert_eq!(c.next_deadline(), Some(mid + DEFAULT_AUTOPLAY_INTERVAL));

        // Over the next 14s exactly two ticks fire, not four.
        let fired = run_for(&mut c, mid, 14 * SECOND);
        assert_eq!(fired, 2);
    }

    #[test]
    fn manual_navigation_pauses_autoplay() {
        let (mut c, now) = opened(4, true);
        assert!(c.navigate(Direction::Forward, now));
        assert_eq!(c.index(), 1);
        assert!(!c.state().autoplay);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn index_change_rearms_the_timer() {
        let (mut c, start) = opened(4, true);
        let later = start + 5 * SECOND;
        c.advance(Direction::Forward, later);
        assert_eq!(c.next_deadline(), Some(later + DEFAULT_AUTOPLAY_INTERVAL));
    }

    #[test]
    fn wheel_events_inside_window_are_dropped() {
        let (mut c, start) = opened(4, false);
        assert!(c.on_wheel(1.0, start));
        assert!(!c.on_wheel(1.0, start + Duration::from_millis(200)));
        assert!(!c.on_wheel(1.0, start + Duration::from_millis(499)));
        assert_eq!(c.index(), 1);
        assert!(c.on_wheel(-1.0, start + Duration::from_millis(500)));
        assert_eq!(c.index(), 0);
        assert!(!c.on_wheel(0.0, start + 2 * SECOND));
    }

    #[test]
    fn begin_export_is_exclusive_and_suspends_autoplay() {
        let (mut c, now) = opened(4, true);
        assert!(c.begin_export());
        assert!(c.state().exporting);
        assert!(!c.state().autoplay);
        assert!(c.next_deadline().is_none());
        assert!(!c.begin_export());

        // User input is ignored while exporting.
        assert!(!c.navigate(Direction::Forward, now));
        assert!(!c.on_wheel(1.0, now));
        assert_eq!(c.index(), 0);

        c.end_export(now);
        assert!(!c.state().exporting);
        assert!(!c.state().autoplay, "autoplay is not restored after export");
    }

    #[test]
    fn jump_to_wraps_out_of_range_indices() {
        let (mut c, now) = opened(4, false);
        c.jump_to(6, now);
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn zero_slides_is_treated_as_one() {
        let (mut c, now) = opened(0, false);
        assert_eq!(c.total(), 1);
        c.advance(Direction::Forward, now);
        assert_eq!(c.index(), 0);
    }
}
