//! Timed display programs
//!
//! A program is a fixed list of steps. Each call to
//! [`DisplayProgram::tick`] returns the next frame once the previous
//! frame's dwell has elapsed, so a scene only has to forward frames to
//! the arbiter. The program keeps running while the scene has lost the
//! display; frames are simply not shown.

use embassy_time::{Duration, Instant};

use super::text::{BLANK, Text4};
use crate::random::Rng;

const MAX_DIGITS: usize = 16;

/// One step of a display program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStep {
    /// Alternate `text` and blank, `toggles` frames in total
    Blink {
        text: &'static str,
        toggles: u8,
        period: Duration,
    },
    /// Scroll `message` from right to left through the four cells
    Scroll {
        message: &'static str,
        step: Duration,
    },
    /// Show fixed text once
    Text { text: &'static str, dwell: Duration },
    /// Random digits, four per frame, a short last chunk right-aligned
    Digits { count: u8, dwell: Duration },
    /// A random future card expiry date as MMYY
    Expiry { dwell: Duration },
}

/// Playback state of a program
#[derive(Debug, Clone)]
pub struct DisplayProgram {
    steps: &'static [ProgramStep],
    index: usize,
    /// Frame counter inside the current step
    frame: usize,
    next_at: Option<Instant>,
    current: Option<Text4>,
    digits: [u8; MAX_DIGITS],
}

impl DisplayProgram {
    pub const fn new(steps: &'static [ProgramStep]) -> Self {
        Self {
            steps,
            index: 0,
            frame: 0,
            next_at: None,
            current: None,
            digits: [b'0'; MAX_DIGITS],
        }
    }

    /// Rewind to the first step
    pub fn restart(&mut self) {
        self.index = 0;
        self.frame = 0;
        self.next_at = None;
        self.current = None;
    }

    /// All steps have played
    pub fn is_finished(&self) -> bool {
        self.index >= self.steps.len()
    }

    /// Last frame produced
    pub const fn current(&self) -> Option<Text4> {
        self.current
    }

    /// Advance the program, returning a frame when a new one is due
    pub fn tick(&mut self, now: Instant, rng: &mut Rng) -> Option<Text4> {
        if self.next_at.is_some_and(|next_at| now < next_at) {
            return None;
        }
        while let Some(step) = self.steps.get(self.index).copied() {
            if let Some((text, dwell)) = self.frame_of(step, rng) {
                self.frame += 1;
                self.next_at = Some(now + dwell);
                self.current = Some(text);
                return Some(text);
            }
            self.index += 1;
            self.frame = 0;
        }
        None
    }

    fn frame_of(&mut self, step: ProgramStep, rng: &mut Rng) -> Option<(Text4, Duration)> {
        let frame = self.frame;
        match step {
            ProgramStep::Blink {
                text,
                toggles,
                period,
            } => {
                if frame >= usize::from(toggles) {
                    return None;
                }
                let shown = if frame % 2 == 0 { Text4::new(text) } else { BLANK };
                Some((shown, period))
            }
            ProgramStep::Scroll { message, step } => {
                let message = message.as_bytes();
                // The message enters from four blanks and leaves into four blanks
                if frame + 4 > message.len() + 8 {
                    return None;
                }
                let mut window = [b' '; 4];
                for (k, cell) in window.iter_mut().enumerate() {
                    let pos = frame + k;
                    if (4..4 + message.len()).contains(&pos) {
                        *cell = message[pos - 4];
                    }
                }
                Some((Text4::from_bytes(&window), step))
            }
            ProgramStep::Text { text, dwell } => (frame == 0).then(|| (Text4::new(text), dwell)),
            ProgramStep::Digits { count, dwell } => {
                let count = usize::from(count).min(MAX_DIGITS);
                if frame == 0 {
                    for digit in &mut self.digits[..count] {
                        *digit = rng.digit();
                    }
                }
                let start = frame * 4;
                if start >= count {
                    return None;
                }
                let chunk = &self.digits[start..(start + 4).min(count)];
                let shown = if chunk.len() == 4 {
                    Text4::from_bytes(chunk)
                } else {
                    Text4::right_aligned(chunk)
                };
                Some((shown, dwell))
            }
            ProgramStep::Expiry { dwell } => (frame == 0).then(|| {
                let month = rng.range(1, 13);
                let year = rng.range(26, 31);
                (Text4(two_digits(month, year)), dwell)
            }),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn two_digits(a: u32, b: u32) -> [u8; 4] {
    [
        b'0' + (a / 10 % 10) as u8,
        b'0' + (a % 10) as u8,
        b'0' + (b / 10 % 10) as u8,
        b'0' + (b % 10) as u8,
    ]
}
