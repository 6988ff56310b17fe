//! Armed "system ready" breathing

use embassy_time::Duration;

use crate::math8::triangle8;

const DEFAULT_PERIOD_MS: u64 = 2_400;
const DEFAULT_MIN: u8 = 30;
const DEFAULT_MAX: u8 = 255;

/// Triangle-wave pulse of the armed LED
#[derive(Debug, Clone, Copy)]
pub struct IdlePulse {
    period: Duration,
    min: u8,
    max: u8,
}

impl Default for IdlePulse {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(DEFAULT_PERIOD_MS),
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl IdlePulse {
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: u8, max: u8) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Armed LED duty at `elapsed` into the idle phase
    pub fn level(&self, elapsed: Duration) -> u8 {
        triangle8(elapsed, self.period, self.min, self.max)
    }
}
