use std::time::{Duration, Instant};

/// Cross-fade length between slides.
pub const FADE_DURATION: Duration = Duration::from_millis(700);
/// Pause before the gate doors start to move.
pub const GATE_DELAY: Duration = Duration::from_millis(500);
/// Time the doors take to swing fully open.
pub const GATE_DURATION: Duration = Duration::from_millis(2500);

/// A running cross-fade between two slides.
pub struct ActiveTransition {
    pub from: usize,
    pub to: usize,
    start: Instant,
}

impl ActiveTransition {
    pub fn new(from: usize, to: usize, start: Instant) -> Self {
        Self { from, to, start }
    }

    /// Eased progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        let t = now.saturating_duration_since(self.start).as_secs_f32()
            / FADE_DURATION.as_secs_f32();
        ease_in_out(t.clamp(0.0, 1.0))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= FADE_DURATION
    }
}

/// The one-time entrance: two doors swinging away from the centre.
pub struct GateAnimation {
    start: Instant,
}

impl GateAnimation {
    pub fn new(start: Instant) -> Self {
        Self { start }
    }

    /// How far the doors have opened, eased, in `[0, 1]`.
    pub fn openness(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        let Some(moving) = elapsed.checked_sub(GATE_DELAY) else {
            return 0.0;
        };
        ease_in_out((moving.as_secs_f32() / GATE_DURATION.as_secs_f32()).clamp(0.0, 1.0))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= GATE_DELAY + GATE_DURATION
    }
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
    }

    #[test]
    fn fade_runs_for_its_duration() {
        let t0 = Instant::now();
        let t = ActiveTransition::new(0, 1, t0);
        assert_eq!(t.progress(t0), 0.0);
        assert!(!t.is_complete(t0 + FADE_DURATION / 2));
        assert!(t.is_complete(t0 + FADE_DURATION));
        assert_eq!(t.progress(t0 + FADE_DURATION * 2), 1.0);
    }

    #[test]
    fn fade_is_eased_not_linear() {
        let t0 = Instant::now();
        let t = ActiveTransition::new(2, 3, t0);
        assert!(t.progress(t0 + FADE_DURATION / 4) < 0.25);
        assert!(t.progress(t0 + FADE_DURATION * 3 / 4) > 0.75);
    }

    #[test]
    fn gate_waits_then_opens() {
        let t0 = Instant::now();
        let gate = GateAnimation::new(t0);
        assert_eq!(gate.openness(t0 + GATE_DELAY / 2), 0.0);
        assert!(!gate.is_complete(t0 + GATE_DELAY));
        assert_eq!(gate.openness(t0 + GATE_DELAY + GATE_DURATION), 1.0);
        assert!(gate.is_complete(t0 + GATE_DELAY + GATE_DURATION));
    }
}
