//! Countdown driving both the shop window and the delay between waves.

use std::time::Duration;

/// Single authoritative countdown that expires at most once per arming.
#[derive(Clone, Debug, Default)]
pub(crate) struct PhaseTimer {
    remaining: Option<Duration>,
}

impl PhaseTimer {
    /// Creates a dormant timer.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown, replacing any pending one.
    pub(crate) fn arm(&mut self, duration: Duration) {
        self.remaining = Some(duration);
    }

    /// Returns the timer to rest without firing.
    pub(crate) fn disarm(&mut self) {
        self.remaining = None;
    }

    /// Reports whether a countdown is pending.
    pub(crate) fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advances the countdown, returning `true` on the tick it reaches zero.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };

        let left = remaining.saturating_sub(dt);
        if left.is_zero() {
            self.remaining = None;
            return true;
        }

        self.remaining = Some(left);
        false
    }

    /// Remaining time rounded to whole seconds; zero while dormant.
    pub(crate) fn remaining_seconds(&self) -> u32 {
        self.remaining.map_or(0, |remaining| {
            let rounded = remaining.as_secs_f64().round();
            if rounded >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                rounded as u32
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PhaseTimer;
    use std::time::Duration;

    #[test]
    fn fires_exactly_once_when_crossing_zero() {
        let mut timer = PhaseTimer::new();
        timer.arm(Duration::from_secs(2));

        let mut fired = 0;
        for _ in 0..10 {
            if timer.advance(Duration::from_millis(500)) {
                fired += 1;
            }
        }

        assert_eq!(fired, 1);
        assert!(!timer.is_armed());
    }

    #[test]
    fn dormant_timer_never_fires() {
        let mut timer = PhaseTimer::new();
        assert!(!timer.advance(Duration::from_secs(60)));
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn rearming_replaces_pending_countdown() {
        let mut timer = PhaseTimer::new();
        timer.arm(Duration::from_secs(1));
        assert!(!timer.advance(Duration::from_millis(600)));
        timer.arm(Duration::from_secs(3));
        assert!(!timer.advance(Duration::from_millis(600)));
        assert_eq!(timer.remaining_seconds(), 2);
    }

    #[test]
    fn zero_duration_fires_on_next_advance() {
        let mut timer = PhaseTimer::new();
        timer.arm(Duration::ZERO);
        assert!(timer.advance(Duration::ZERO));
        assert!(!timer.advance(Duration::ZERO));
    }

    #[test]
    fn remaining_seconds_rounds_to_nearest() {
        let mut timer = PhaseTimer::new();
        timer.arm(Duration::from_millis(2_600));
        assert_eq!(timer.remaining_seconds(), 3);
        assert!(!timer.advance(Duration::from_millis(300)));
        assert_eq!(timer.remaining_seconds(), 2);
        timer.disarm();
        assert_eq!(timer.remaining_seconds(), 0);
    }
}
