//! Reconnect delay

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Doubling reconnect delay between a floor and a cap
#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(floor: Duration, cap: Duration) -> Self {
        let cap = cap.max(floor);
        Self {
            floor,
            cap,
            current: floor,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Delay to wait now; the one after it is twice as long
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.cap);
        delay
    }

    /// Back to the floor after a successful read
    pub fn reset(&mut self) {
        self.current = self.floor;
    }

    /// Delay the next failure will wait
    pub fn current(&self) -> Duration {
        self.current
    }
}
