//! Cooldown-based debouncing
//!
//! Process-local last-triggered timestamps per signal type. State is
//! in-memory only: a restart resets every cooldown, so operators may
//! see a burst of repeat notifications right after a redeploy.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::signal::SignalType;

/// Tracks the last notification time per signal type and suppresses
/// repeats inside the configured window.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    window: Duration,
    last_triggered: HashMap<SignalType, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_triggered: HashMap::new(),
        }
    }

    /// True iff no prior trigger exists for `signal` or the window has
    /// fully elapsed since the last one. A type with no entry is
    /// always eligible; there is no false suppression on first breach.
    pub fn should_trigger(&self, signal: SignalType, now: DateTime<Utc>) -> bool {
        match self.last_triggered.get(&signal) {
            None => true,
            Some(last) => now - *last >= self.window,
        }
    }

    /// Unconditionally overwrite the last-triggered timestamp.
    pub fn register(&mut self, signal: SignalType, now: DateTime<Utc>) {
        self.last_triggered.insert(signal, now);
    }

    pub fn last_triggered(&self, signal: SignalType) -> Option<DateTime<Utc>> {
        self.last_triggered.get(&signal).copied()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_first_trigger_always_allowed() {
        let tracker = CooldownTracker::new(Duration::minutes(10));
        for signal in SignalType::ALL {
            assert!(tracker.should_trigger(signal, at(0)));
        }
    }

    #[test]
    fn test_suppressed_inside_window() {
        let mut tracker = CooldownTracker::new(Duration::minutes(10));
        tracker.register(SignalType::Ph, at(0));

        assert!(!tracker.should_trigger(SignalType::Ph, at(3)));
        assert!(!tracker.should_trigger(SignalType::Ph, at(9)));
    }

    #[test]
    fn test_allowed_at_window_boundary_and_beyond() {
        let mut tracker = CooldownTracker::new(Duration::minutes(10));
        tracker.register(SignalType::Ph, at(0));

        // Δ == window must be allowed.
        assert!(tracker.should_trigger(SignalType::Ph, at(10)));
        assert!(tracker.should_trigger(SignalType::Ph, at(25)));
    }

    #[test]
    fn test_cooldown_is_per_signal_type() {
        let mut tracker = CooldownTracker::new(Duration::minutes(10));
        tracker.register(SignalType::Ph, at(0));

        assert!(!tracker.should_trigger(SignalType::Ph, at(5)));
        assert!(tracker.should_trigger(SignalType::Flow, at(5)));
    }

    #[test]
    fn test_register_overwrites_previous_entry() {
        let mut tracker = CooldownTracker::new(Duration::minutes(10));
        tracker.register(SignalType::Ph, at(0));
        tracker.register(SignalType::Ph, at(12));

        assert!(!tracker.should_trigger(SignalType::Ph, at(15)));
        assert_eq!(tracker.last_triggered(SignalType::Ph), Some(at(12)));
    }
}
