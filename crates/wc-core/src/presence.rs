use crate::clock::Clock;
use chrono::{DateTime, NaiveDateTime};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Tracks when the user last interacted. The timestamp only moves forward,
/// so late-arriving input events can never make the user look idler.
pub struct PresenceMonitor {
    clock: Arc<dyn Clock>,
    last_activity_ms: AtomicI64,
}

impl PresenceMonitor {
    /// Starts with "now" as the last activity.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = to_millis(clock.now());
        Self {
            clock,
            last_activity_ms: AtomicI64::new(now),
        }
    }

    pub fn record_activity(&self) {
        self.record_activity_at(self.clock.now());
    }

    pub fn record_activity_at(&self, at: NaiveDateTime) {
        self.last_activity_ms
            .fetch_max(to_millis(at), Ordering::AcqRel);
    }

    pub fn last_activity(&self) -> NaiveDateTime {
        let millis = self.last_activity_ms.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(millis)
            .map(|at| at.naive_utc())
            .unwrap_or_default()
    }

    pub fn idle_for(&self) -> Duration {
        let now = to_millis(self.clock.now());
        let last = self.last_activity_ms.load(Ordering::Acquire);
        Duration::from_millis(u64::try_from(now - last).unwrap_or(0))
    }

    /// Zero means "always idle", which makes alerts fire immediately.
    pub fn is_idle_beyond(&self, threshold: Duration) -> bool {
        threshold.is_zero() || self.idle_for() > threshold
    }
}

fn to_millis(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{NaiveDate, TimeDelta};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    #[test]
    fn idleness_grows_with_the_clock() {
        let clock = Arc::new(ManualClock::new(start()));
        let presence = PresenceMonitor::new(clock.clone());
        assert!(!presence.is_idle_beyond(Duration::from_secs(30)));
        clock.advance(TimeDelta::seconds(31));
        assert!(presence.is_idle_beyond(Duration::from_secs(30)));
        assert_eq!(presence.idle_for(), Duration::from_secs(31));
    }

    #[test]
    fn activity_resets_idle_clock() {
        let clock = Arc::new(ManualClock::new(start()));
        let presence = PresenceMonitor::new(clock.clone());
        clock.advance(TimeDelta::minutes(5));
        presence.record_activity();
        assert_eq!(presence.idle_for(), Duration::ZERO);
        assert_eq!(presence.last_activity(), start() + TimeDelta::minutes(5));
    }

    #[test]
    fn stale_events_do_not_move_backwards() {
        let clock = Arc::new(ManualClock::new(start()));
        let presence = PresenceMonitor::new(clock.clone());
        presence.record_activity_at(start() - TimeDelta::hours(1));
        assert_eq!(presence.last_activity(), start());
    }

    #[test]
    fn zero_threshold_is_always_idle() {
        let clock = Arc::new(ManualClock::new(start()));
        let presence = PresenceMonitor::new(clock);
        presence.record_activity();
        assert!(presence.is_idle_beyond(Duration::ZERO));
    }
}
