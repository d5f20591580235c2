//! Manually driven clock

use anidb_udp_core::protocol::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct ClockState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

/// Clock whose sleeps return at once and advance the current time
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    /// Start at the given Unix time
    pub fn at(timestamp: i64) -> Self {
        let now = DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH);
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().expect("clock lock poisoned");
        state.now += TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
    }

    /// Every sleep requested so far
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().expect("clock lock poisoned").sleeps.clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(1_700_000_000)
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().expect("clock lock poisoned").now
    }

    async fn sleep(&self, duration: Duration) {
        self.state
            .lock()
            .expect("clock lock poisoned")
            .sleeps
            .push(duration);
        self.advance(duration);
    }
}
