//! Hold "alarm" stutter
//!
//! A square-wave blink that gets faster and brighter while the hold
//! runs:
//!
//! ```text
//! period(t)     = slow - (slow - fast) * clamp(t, 0, T) / T
//! brightness(t) = base + range * clamp(t, 0, T) / T
//! ```

use embassy_time::Duration;

const PERIOD_SLOW_MS: u64 = 300;
const PERIOD_FAST_MS: u64 = 40;
const BASE_BRIGHTNESS: u8 = 60;
const BRIGHTNESS_RANGE: u8 = 195;
/// Share of each period the LED is lit, in percent
const DUTY_PERCENT: u64 = 45;

/// Escalating blink of the hold LED
#[derive(Debug, Clone, Copy)]
pub struct HoldStutter {
    slow: Duration,
    fast: Duration,
    base: u8,
    range: u8,
}

impl Default for HoldStutter {
    fn default() -> Self {
        Self {
            slow: Duration::from_millis(PERIOD_SLOW_MS),
            fast: Duration::from_millis(PERIOD_FAST_MS),
            base: BASE_BRIGHTNESS,
            range: BRIGHTNESS_RANGE,
        }
    }
}

impl HoldStutter {
    /// Blink period at `elapsed` into a hold of length `duration`
    pub fn period(&self, elapsed: Duration, duration: Duration) -> Duration {
        let (num, den) = progress(elapsed, duration);
        let slow = self.slow.as_millis();
        let fast = self.fast.as_millis().min(slow);
        Duration::from_millis(slow - (slow - fast) * num / den)
    }

    /// Peak brightness at `elapsed` into a hold of length `duration`
    #[allow(clippy::cast_possible_truncation)]
    pub fn brightness(&self, elapsed: Duration, duration: Duration) -> u8 {
        let (num, den) = progress(elapsed, duration);
        let lift = (u64::from(self.range) * num / den) as u8;
        self.base.saturating_add(lift)
    }

    /// LED duty for this instant: the brightness while in the lit part of
    /// the period, zero otherwise
    pub fn level(&self, elapsed: Duration, duration: Duration) -> u8 {
        let period = self.period(elapsed, duration).as_millis().max(1);
        let lit = elapsed.as_millis() % period < period * DUTY_PERCENT / 100;
        if lit {
            self.brightness(elapsed, duration)
        } else {
            0
        }
    }
}

/// `clamp(t, 0, T) / T` as a fraction. A zero-length hold counts as complete.
fn progress(elapsed: Duration, duration: Duration) -> (u64, u64) {
    let den = duration.as_millis();
    if den == 0 {
        return (1, 1);
    }
    (elapsed.as_millis().min(den), den)
}
