//! Show-control trigger bus
//!
//! Output lines tell the external media player which cue to start and
//! which show mode the director is in. A pulse raises the line for
//! [`PULSE_WIDTH`] and is lowered by [`TriggerBus::service`] on a later
//! tick; nothing here blocks.

use embassy_time::{Duration, Instant};

use crate::director_log;
use crate::hardware::TriggerLines;

/// How long a line stays high
pub const PULSE_WIDTH: Duration = Duration::from_millis(100);

/// Minimum quiet time on a channel after its pulse ended
pub const LOCKOUT: Duration = Duration::from_millis(300);

/// Trigger channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerChannel {
    Show = 0,
    Blood = 1,
    Grave = 2,
    Fur = 3,
    Franken = 4,
    /// Show switched to the automatic sequence
    StartLoop = 5,
    /// Show armed for beam triggers
    StartTrigger = 6,
    /// Show switched to attract playback
    StartAttract = 7,
    /// Show stopped
    StopAll = 8,
}

impl TriggerChannel {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Show,
        Self::Blood,
        Self::Grave,
        Self::Fur,
        Self::Franken,
        Self::StartLoop,
        Self::StartTrigger,
        Self::StartAttract,
        Self::StopAll,
    ];

    const NAMES: [&'static str; Self::COUNT] = [
        "SHOW", "BLOOD", "GRAVE", "FUR", "FRANKEN", "LOOP", "TRIGGER", "ATTRACT", "STOP",
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(idx: usize) -> Option<Self> {
        if idx < Self::COUNT {
            Some(Self::ALL[idx])
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Parse a channel name (case-insensitive) or index
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(idx) = s.parse::<usize>() {
            return Self::from_index(idx);
        }
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Line {
    /// Set while the line is high
    lower_at: Option<Instant>,
    /// End of the last pulse
    lowered_at: Option<Instant>,
}

/// Non-blocking pulse generator for all trigger lines
#[derive(Debug, Clone, Default)]
pub struct TriggerBus {
    lines: [Line; TriggerChannel::COUNT],
}

impl TriggerBus {
    pub const fn new() -> Self {
        Self {
            lines: [Line {
                lower_at: None,
                lowered_at: None,
            }; TriggerChannel::COUNT],
        }
    }

    /// Raise `channel` for one pulse width
    ///
    /// Refused while the line is already high or still inside the
    /// lockout after its previous pulse.
    pub fn fire<L: TriggerLines>(
        &mut self,
        channel: TriggerChannel,
        lines: &mut L,
        now: Instant,
    ) -> bool {
        let line = &mut self.lines[channel.index()];
        if line.lower_at.is_some() {
            director_log!("[trig] {} busy", channel.as_str());
            return false;
        }
        if line
            .lowered_at
            .is_some_and(|lowered_at| now.saturating_duration_since(lowered_at) < LOCKOUT)
        {
            director_log!("[trig] {} locked out", channel.as_str());
            return false;
        }
        lines.set_line(channel, true);
        line.lower_at = Some(now + PULSE_WIDTH);
        director_log!("[trig] pulse {}", channel.as_str());
        true
    }

    /// Lower every line whose pulse has run out
    pub fn service<L: TriggerLines>(&mut self, lines: &mut L, now: Instant) {
        for (channel, line) in TriggerChannel::ALL.into_iter().zip(self.lines.iter_mut()) {
            if line.lower_at.is_some_and(|lower_at| now >= lower_at) {
                lines.set_line(channel, false);
                line.lower_at = None;
                line.lowered_at = Some(now);
            }
        }
    }

    /// Whether `channel` is currently high
    pub fn is_high(&self, channel: TriggerChannel) -> bool {
        self.lines[channel.index()].lower_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lines {
        high: [bool; TriggerChannel::COUNT],
        edges: u32,
    }

    impl TriggerLines for Lines {
        fn set_line(&mut self, channel: TriggerChannel, high: bool) {
            self.high[channel.index()] = high;
            self.edges += 1;
        }
    }

    #[test]
    fn test_parse_names_and_indices() {
        assert_eq!(TriggerChannel::parse("grave"), Some(TriggerChannel::Grave));
        assert_eq!(TriggerChannel::parse("4"), Some(TriggerChannel::Franken));
        assert_eq!(TriggerChannel::parse("stop"), Some(TriggerChannel::StopAll));
        assert_eq!(TriggerChannel::parse("5"), Some(TriggerChannel::StartLoop));
        assert_eq!(TriggerChannel::parse("9"), None);
        assert_eq!(TriggerChannel::parse("LIGHT"), None);
    }

    #[test]
    fn test_pulse_is_lowered_by_service() {
        let mut bus = TriggerBus::new();
        let mut lines = Lines::default();
        assert!(bus.fire(TriggerChannel::Blood, &mut lines, Instant::from_millis(1_000)));
        assert!(lines.high[1]);
        bus.service(&mut lines, Instant::from_millis(1_099));
        assert!(lines.high[1]);
        bus.service(&mut lines, Instant::from_millis(1_100));
        assert!(!lines.high[1]);
        assert_eq!(lines.edges, 2);
    }
}
