//! Tone sequences
//!
//! A [`ToneProgram`] slices the hold phase into fixed windows, each
//! running one [`ToneSegment`]. [`TonePlayer`] samples the program with
//! the time spent in the phase and only changes its output at a bounded
//! rate, so the tone generator is not retuned every tick.

use embassy_time::Duration;

use crate::math8::lerp16;
use crate::random::Rng;

/// Sweeps are re-evaluated at most this often
const SWEEP_STEP: Duration = Duration::from_millis(10);

/// Sound of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneSegment {
    /// Linear glide across the window
    Sweep { from: u16, to: u16 },
    /// A new random frequency in `[min, max)` every `every`
    Hop { min: u16, max: u16, every: Duration },
    /// Two tones alternating every `every`
    Alternate { low: u16, high: u16, every: Duration },
    /// One fixed tone
    Steady(u16),
    /// Short chirp of `on` at the start of every `every`
    Chirp { hz: u16, on: Duration, every: Duration },
}

/// A segment and the phase offset at which it ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneWindow {
    /// `None` runs until the end of the phase
    pub end: Option<Duration>,
    pub segment: ToneSegment,
}

impl ToneWindow {
    pub const fn until(end_ms: u64, segment: ToneSegment) -> Self {
        Self {
            end: Some(Duration::from_millis(end_ms)),
            segment,
        }
    }

    pub const fn rest(segment: ToneSegment) -> Self {
        Self { end: None, segment }
    }
}

/// Windows in playing order
pub type ToneProgram = &'static [ToneWindow];

/// No sound at all
pub const SILENT_TONE: ToneProgram = &[];

/// Escalating dial-up "connecting" sound
pub const MODEM_TONE: ToneProgram = &[
    ToneWindow::until(800, ToneSegment::Sweep { from: 400, to: 1800 }),
    ToneWindow::until(1_600, ToneSegment::Sweep { from: 1800, to: 600 }),
    ToneWindow::until(
        3_000,
        ToneSegment::Hop {
            min: 400,
            max: 2500,
            every: Duration::from_millis(6),
        },
    ),
    ToneWindow::until(
        4_200,
        ToneSegment::Alternate {
            low: 1400,
            high: 1800,
            every: Duration::from_millis(40),
        },
    ),
    ToneWindow::rest(ToneSegment::Steady(1000)),
];

/// Water drip: a 50 ms chirp every two seconds
pub const DRIP_TONE: ToneProgram = &[ToneWindow::rest(ToneSegment::Chirp {
    hz: 2200,
    on: Duration::from_millis(50),
    every: Duration::from_millis(2_000),
})];

/// Playback state of a tone program
#[derive(Debug, Clone, Copy, Default)]
pub struct TonePlayer {
    window: Option<usize>,
    changed_at: Duration,
    current: Option<u16>,
}

impl TonePlayer {
    pub const fn new() -> Self {
        Self {
            window: None,
            changed_at: Duration::from_ticks(0),
            current: None,
        }
    }

    /// Restart from the first window
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Frequency at `elapsed` into a phase of length `total`
    ///
    /// Silent once `elapsed` reaches `total`.
    pub fn sample(
        &mut self,
        program: ToneProgram,
        elapsed: Duration,
        total: Duration,
        rng: &mut Rng,
    ) -> Option<u16> {
        if elapsed >= total {
            self.window = None;
            self.current = None;
            return None;
        }
        let Some(idx) = program
            .iter()
            .position(|window| window.end.is_none_or(|end| elapsed < end))
        else {
            self.window = None;
            self.current = None;
            return None;
        };
        let window = program[idx];
        let start = idx
            .checked_sub(1)
            .and_then(|prev| program[prev].end)
            .unwrap_or(Duration::from_ticks(0));
        let end = window.end.unwrap_or(total).min(total);

        let entered = self.window != Some(idx);
        if entered {
            self.window = Some(idx);
            self.changed_at = elapsed;
        }
        let since = elapsed.checked_sub(self.changed_at).unwrap_or(Duration::from_ticks(0));

        match window.segment {
            ToneSegment::Sweep { from, to } => {
                if entered || since >= SWEEP_STEP {
                    let span = end.checked_sub(start).unwrap_or(Duration::from_ticks(0));
                    let into = elapsed.checked_sub(start).unwrap_or(Duration::from_ticks(0));
                    self.current = Some(lerp16(from, to, into.as_millis(), span.as_millis()));
                    self.changed_at = elapsed;
                }
            }
            ToneSegment::Hop { min, max, every } => {
                if entered || since >= every {
                    #[allow(clippy::cast_possible_truncation)]
                    let hz = rng.range(u32::from(min), u32::from(max)) as u16;
                    self.current = Some(hz);
                    self.changed_at = elapsed;
                }
            }
            ToneSegment::Alternate { low, high, every } => {
                if entered {
                    self.current = Some(low);
                } else if since >= every {
                    self.current = Some(if self.current == Some(low) { high } else { low });
                    self.changed_at = elapsed;
                }
            }
            ToneSegment::Steady(hz) => self.current = Some(hz),
            ToneSegment::Chirp { hz, on, every } => {
                let every_ms = every.as_millis().max(1);
                let into = elapsed.checked_sub(start).unwrap_or(Duration::from_ticks(0));
                self.current = (into.as_millis() % every_ms < on.as_millis()).then_some(hz);
            }
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Duration = Duration::from_millis(5_000);

    fn at(player: &mut TonePlayer, program: ToneProgram, ms: u64, rng: &mut Rng) -> Option<u16> {
        player.sample(program, Duration::from_millis(ms), TOTAL, rng)
    }

    #[test]
    fn test_modem_windows() {
        let mut player = TonePlayer::new();
        let mut rng = Rng::new(9);
        assert_eq!(at(&mut player, MODEM_TONE, 0, &mut rng), Some(400));
        assert_eq!(at(&mut player, MODEM_TONE, 400, &mut rng), Some(1100));
        assert_eq!(at(&mut player, MODEM_TONE, 800, &mut rng), Some(1800));
        let hop = at(&mut player, MODEM_TONE, 2_000, &mut rng);
        assert!(hop.is_some_and(|hz| (400..2500).contains(&hz)));
        assert_eq!(at(&mut player, MODEM_TONE, 3_000, &mut rng), Some(1400));
        assert_eq!(at(&mut player, MODEM_TONE, 3_040, &mut rng), Some(1800));
        assert_eq!(at(&mut player, MODEM_TONE, 4_500, &mut rng), Some(1000));
        assert_eq!(at(&mut player, MODEM_TONE, 5_000, &mut rng), None);
    }

    #[test]
    fn test_sweep_rate_is_bounded() {
        let mut player = TonePlayer::new();
        let mut rng = Rng::new(9);
        let first = at(&mut player, MODEM_TONE, 100, &mut rng);
        for ms in 101..110 {
            assert_eq!(at(&mut player, MODEM_TONE, ms, &mut rng), first);
        }
        assert_ne!(at(&mut player, MODEM_TONE, 110, &mut rng), first);
    }

    #[test]
    fn test_drip_chirps() {
        let mut player = TonePlayer::new();
        let mut rng = Rng::new(1);
        assert_eq!(at(&mut player, DRIP_TONE, 10, &mut rng), Some(2200));
        assert_eq!(at(&mut player, DRIP_TONE, 60, &mut rng), None);
        assert_eq!(at(&mut player, DRIP_TONE, 2_020, &mut rng), Some(2200));
        assert_eq!(at(&mut player, SILENT_TONE, 10, &mut rng), None);
    }
}
