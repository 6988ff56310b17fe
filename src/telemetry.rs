//! Telemetry frames
//!
//! A compact snapshot written to the console at a fixed interval, framed
//! with `/*` and `*/` so a serial plotter can pick it out of the reply
//! stream:
//!
//! ```text
//! /*millis,scene,phase,beams,magnet,buzzer,r,g,b*/
//! ```
//!
//! `beams` is a bit mask of the broken slots, `magnet` and `buzzer` are
//! `0` or `1`, and `r,g,b` is the status strip blended into one color.

use core::fmt;

use embassy_time::{Duration, Instant};

use crate::Rgb;
use crate::effect::EffectFrame;
use crate::scene::{Phase, SceneId};

/// Shortest accepted interval
pub const MIN_INTERVAL_MS: u32 = 10;

/// Longest accepted interval
pub const MAX_INTERVAL_MS: u32 = 60_000;

/// One telemetry sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame {
    pub at: Instant,
    /// [`SceneId::Standby`] while idle
    pub scene: SceneId,
    pub phase: Phase,
    /// Bit `n` is set while slot `n` is broken
    pub beams: u8,
    pub magnet: bool,
    pub buzzer: bool,
    pub color: Rgb,
}

impl TelemetryFrame {
    /// Sample built from the outputs of the last tick
    pub fn new(at: Instant, scene: SceneId, phase: Phase, beams: u8, effect: EffectFrame) -> Self {
        Self {
            at,
            scene,
            phase,
            beams,
            magnet: effect.magnet,
            buzzer: effect.tone.is_some(),
            color: blend(&effect.leds.to_frame()),
        }
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/*{},{},{},{},{},{},{},{},{}*/",
            self.at.as_millis(),
            self.scene.as_str(),
            self.phase.as_str(),
            self.beams,
            u8::from(self.magnet),
            u8::from(self.buzzer),
            self.color.r,
            self.color.g,
            self.color.b
        )
    }
}

/// Saturating sum of every LED
fn blend(colors: &[Rgb]) -> Rgb {
    colors.iter().fold(Rgb::default(), |acc, color| Rgb {
        r: acc.r.saturating_add(color.r),
        g: acc.g.saturating_add(color.g),
        b: acc.b.saturating_add(color.b),
    })
}

/// When the next frame is due
#[derive(Debug, Clone, Copy)]
pub struct Telemetry {
    /// `None` while switched off
    interval: Option<Duration>,
    next_at: Instant,
}

impl Telemetry {
    pub const fn new(interval: Option<Duration>, now: Instant) -> Self {
        Self {
            interval,
            next_at: now,
        }
    }

    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Change the interval. A new interval emits on the next tick.
    pub fn set_interval(&mut self, interval: Option<Duration>, now: Instant) {
        self.interval = interval;
        self.next_at = now;
    }

    /// Whether a frame is due at `now`, scheduling the next one if so
    pub fn due(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        if now < self.next_at {
            return false;
        }
        self.next_at = now + interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::StatusLevels;

    #[test]
    fn test_frame_format() {
        let effect = EffectFrame {
            leds: StatusLevels::hold(255),
            tone: Some(1800),
            magnet: true,
        };
        let frame = TelemetryFrame::new(
            Instant::from_millis(1_234),
            SceneId::FrankenLab,
            Phase::Hold,
            0b101,
            effect,
        );
        let mut line: heapless::String<64> = heapless::String::new();
        assert!(fmt::Write::write_fmt(&mut line, format_args!("{frame}")).is_ok());
        assert_eq!(line.as_str(), "/*1234,FRANKENLAB,HOLD,5,1,1,255,0,0*/");
    }

    #[test]
    fn test_blend_saturates() {
        let colors = [
            Rgb { r: 200, g: 0, b: 10 },
            Rgb { r: 100, g: 20, b: 0 },
        ];
        assert_eq!(blend(&colors), Rgb { r: 255, g: 20, b: 10 });
    }

    #[test]
    fn test_schedule() {
        let mut telemetry = Telemetry::new(None, Instant::from_millis(0));
        assert!(!telemetry.due(Instant::from_millis(0)));

        telemetry.set_interval(Some(Duration::from_millis(100)), Instant::from_millis(5));
        assert!(telemetry.due(Instant::from_millis(5)));
        assert!(!telemetry.due(Instant::from_millis(104)));
        assert!(telemetry.due(Instant::from_millis(105)));

        telemetry.set_interval(None, Instant::from_millis(106));
        assert!(!telemetry.due(Instant::from_millis(500)));
    }
}
