//! Effect animators
//!
//! Each animator is a function of the time spent in the current phase
//! (plus a little phase-local state for the randomized ones). They
//! produce an [`EffectFrame`]; the scene engine hands the frame to
//! [`OutputLatch`], which only touches a driver when a value changes.
//! Calling an animator twice in the same millisecond is therefore
//! harmless.

mod cooldown_flicker;
mod hold_stutter;
mod idle_pulse;
mod tone;

use embassy_time::Duration;

pub use cooldown_flicker::CooldownFlicker;
pub use hold_stutter::HoldStutter;
pub use idle_pulse::IdlePulse;
pub use tone::{
    DRIP_TONE, MODEM_TONE, SILENT_TONE, ToneProgram, TonePlayer, ToneSegment, ToneWindow,
};

use crate::Rgb;
use crate::hardware::{Buzzer, Magnet, StatusLeds};
use crate::math8::{scale8, triangle8};

/// Number of status LEDs (armed, hold, cooldown)
pub const STATUS_LED_COUNT: usize = 3;

/// Full-brightness color of the armed LED
pub const ARMED_COLOR: Rgb = Rgb { r: 0, g: 255, b: 0 };
/// Full-brightness color of the hold LED
pub const HOLD_COLOR: Rgb = Rgb { r: 255, g: 0, b: 0 };
/// Full-brightness color of the cooldown LED
pub const COOLDOWN_COLOR: Rgb = Rgb { r: 255, g: 170, b: 0 };

/// Duty of each status LED (0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusLevels {
    pub armed: u8,
    pub hold: u8,
    pub cooldown: u8,
}

impl StatusLevels {
    pub const OFF: Self = Self {
        armed: 0,
        hold: 0,
        cooldown: 0,
    };

    pub const fn armed(level: u8) -> Self {
        Self {
            armed: level,
            ..Self::OFF
        }
    }

    pub const fn hold(level: u8) -> Self {
        Self {
            hold: level,
            ..Self::OFF
        }
    }

    pub const fn cooldown(level: u8) -> Self {
        Self {
            cooldown: level,
            ..Self::OFF
        }
    }

    /// Render the duties into LED colors
    pub fn to_frame(self) -> [Rgb; STATUS_LED_COUNT] {
        [
            scale_color(ARMED_COLOR, self.armed),
            scale_color(HOLD_COLOR, self.hold),
            scale_color(COOLDOWN_COLOR, self.cooldown),
        ]
    }
}

fn scale_color(color: Rgb, level: u8) -> Rgb {
    if level == 0 {
        return Rgb { r: 0, g: 0, b: 0 };
    }
    Rgb {
        r: scale8(color.r, level),
        g: scale8(color.g, level),
        b: scale8(color.b, level),
    }
}

/// Everything an animator decides for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectFrame {
    pub leds: StatusLevels,
    /// Buzzer frequency, `None` is silent
    pub tone: Option<u16>,
    pub magnet: bool,
}

impl EffectFrame {
    /// Everything dark, silent and released
    pub const QUIET: Self = Self {
        leds: StatusLevels::OFF,
        tone: None,
        magnet: false,
    };
}

/// Look of the hold LED during a scene's active phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldLook {
    /// Escalating red stutter
    Stutter,
    /// Hard on/off toggling
    Strobe { period: Duration },
    /// Triangle breathing
    Pulse { period: Duration },
}

impl HoldLook {
    /// Hold LED duty at `elapsed` into a hold of length `duration`
    pub fn level(self, stutter: &HoldStutter, elapsed: Duration, duration: Duration) -> u8 {
        match self {
            Self::Stutter => stutter.level(elapsed, duration),
            Self::Strobe { period } => {
                let period_ms = period.as_millis().max(1);
                if (elapsed.as_millis() / period_ms) % 2 == 0 {
                    255
                } else {
                    0
                }
            }
            Self::Pulse { period } => triangle8(elapsed, period, 20, 255),
        }
    }
}

/// Remembers what was last sent to each driver
///
/// Writes only reach the hardware when a value changes, so redundant
/// calls within a tick (or across ticks) never retrigger the buzzer.
#[derive(Debug, Clone, Default)]
pub struct OutputLatch {
    last: Option<EffectFrame>,
}

impl OutputLatch {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Frame most recently applied
    pub const fn last(&self) -> Option<EffectFrame> {
        self.last
    }

    /// Push the differences between `frame` and the last frame
    pub fn apply<O>(&mut self, frame: EffectFrame, out: &mut O)
    where
        O: StatusLeds + Buzzer + Magnet,
    {
        let previous = self.last;
        if previous.map(|p| p.leds) != Some(frame.leds) {
            out.write(&frame.leds.to_frame());
        }
        if previous.map(|p| p.tone) != Some(frame.tone) {
            match frame.tone {
                Some(hz) => out.tone(hz),
                None => out.silence(),
            }
        }
        if previous.map(|p| p.magnet) != Some(frame.magnet) {
            out.set_engaged(frame.magnet);
        }
        self.last = Some(frame);
    }
}
