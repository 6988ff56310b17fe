//! Cooldown "powering down" flicker

use embassy_time::{Duration, Instant};

use crate::random::Rng;

const LEVEL_MIN: u32 = 40;
const LEVEL_MAX: u32 = 255;
const DWELL_MIN_MS: u32 = 20;
const DWELL_MAX_MS: u32 = 120;

/// Randomized level changes with randomized dwell times
///
/// The level is held until its dwell runs out, so repeated calls before
/// that return the same value.
#[derive(Debug, Clone, Copy)]
pub struct CooldownFlicker {
    level: u8,
    next_change: Option<Instant>,
}

impl Default for CooldownFlicker {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownFlicker {
    pub const fn new() -> Self {
        Self {
            level: 0,
            next_change: None,
        }
    }

    /// Forget the current dwell; the next call picks a fresh level
    pub fn reset(&mut self) {
        self.next_change = None;
    }

    /// Cooldown LED duty at `now`
    #[allow(clippy::cast_possible_truncation)]
    pub fn level(&mut self, now: Instant, rng: &mut Rng) -> u8 {
        if self.next_change.is_some_and(|at| now < at) {
            return self.level;
        }
        self.level = rng.range(LEVEL_MIN, LEVEL_MAX + 1) as u8;
        let dwell = rng.range(DWELL_MIN_MS, DWELL_MAX_MS + 1);
        self.next_change = Some(now + Duration::from_millis(u64::from(dwell)));
        self.level
    }
}
