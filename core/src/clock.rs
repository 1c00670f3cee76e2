//! Engine clock: the time source and the market tick schedule.
//!
//! Production engines read the system clock. Tests build a manual clock
//! and move it forward explicitly, so session timeouts and the market
//! period are reproducible.

use crate::types::Tick;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub enum GameClock {
    System,
    Manual(Mutex<DateTime<Utc>>),
}

impl GameClock {
    pub fn system() -> Self {
        Self::System
    }

    pub fn manual(start: DateTime<Utc>) -> Self {
        Self::Manual(Mutex::new(start))
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System       => Utc::now(),
            Self::Manual(time) => *time.lock(),
        }
    }

    /// Move a manual clock forward. No-op on the system clock.
    pub fn advance(&self, by: Duration) {
        match self {
            Self::System => log::warn!("advance() called on system clock; ignored"),
            Self::Manual(time) => {
                let mut t = time.lock();
                *t += by;
            }
        }
    }
}

/// Fixed wall-clock cadence for market ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSchedule {
    pub period_secs:  i64,
    pub current_tick: Tick,
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl MarketSchedule {
    pub fn new(period_secs: i64) -> Self {
        Self {
            period_secs,
            current_tick: 0,
            last_tick_at: None,
        }
    }

    /// True once a full period has elapsed since the last tick.
    /// The first call only arms the schedule.
    pub fn due(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_tick_at {
            None => {
                self.last_tick_at = Some(now);
                false
            }
            Some(last) => now - last >= Duration::seconds(self.period_secs),
        }
    }

    /// Record that a tick ran at `now`. Returns the new tick number.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Tick {
        self.current_tick += 1;
        self.last_tick_at = Some(now);
        self.current_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_fires_after_one_period() {
        let start = Utc::now();
        let mut schedule = MarketSchedule::new(300);
        assert!(!schedule.due(start), "first call only arms the schedule");
        assert!(!schedule.due(start + Duration::seconds(299)));
        assert!(schedule.due(start + Duration::seconds(300)));

        let tick = schedule.advance(start + Duration::seconds(300));
        assert_eq!(tick, 1);
        assert!(!schedule.due(start + Duration::seconds(301)));
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let start = Utc::now();
        let clock = GameClock::manual(start);
        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(61));
        assert_eq!(clock.now(), start + Duration::seconds(61));
    }
}
