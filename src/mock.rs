//! In-memory hardware
//!
//! Deterministic implementations of every port, used by the tests and
//! the desktop preview. Inputs are set directly, outputs are recorded.

use heapless::{Deque, String};

use crate::Rgb;
use crate::devices::Relay;
use crate::effect::STATUS_LED_COUNT;
use crate::hardware::{
    AlphaDisplay, BeamInputs, Buzzer, ConsoleIo, Magnet, RelayOutputs, SettingsStorage, StatusLeds,
    TriggerLines,
};
use crate::settings::RECORD_LEN;
use crate::trigger::TriggerChannel;

/// Highest simulated pin number plus one
pub const PIN_COUNT: usize = 64;

const INPUT_LEN: usize = 256;
const OUTPUT_LINES: usize = 64;
const OUTPUT_LINE_LEN: usize = 96;

/// One recorded console line
pub type OutputLine = String<OUTPUT_LINE_LEN>;

/// Every port except the display
pub struct MockBoard {
    /// Electrical level per pin; inputs idle HIGH (pulled up)
    pub levels: [bool; PIN_COUNT],
    pub leds: [Rgb; STATUS_LED_COUNT],
    pub led_writes: u32,
    pub tone: Option<u16>,
    pub tone_writes: u32,
    pub magnet: bool,
    pub magnet_writes: u32,
    pub trigger_lines: [bool; TriggerChannel::COUNT],
    /// Rising edges per trigger channel
    pub trigger_pulses: [u32; TriggerChannel::COUNT],
    pub relays: [bool; 3],
    pub input: Deque<u8, INPUT_LEN>,
    pub output: Deque<OutputLine, OUTPUT_LINES>,
    /// Persisted record, `None` when storage is blank
    pub storage: Option<[u8; RECORD_LEN]>,
    pub fail_writes: bool,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            levels: [true; PIN_COUNT],
            leds: [Rgb::default(); STATUS_LED_COUNT],
            led_writes: 0,
            tone: None,
            tone_writes: 0,
            magnet: false,
            magnet_writes: 0,
            trigger_lines: [false; TriggerChannel::COUNT],
            trigger_pulses: [0; TriggerChannel::COUNT],
            relays: [false; 3],
            input: Deque::new(),
            output: Deque::new(),
            storage: None,
            fail_writes: false,
        }
    }

    /// Pull an active-low beam input LOW
    pub fn break_beam(&mut self, pin: u8) {
        self.set_level(pin, false);
    }

    /// Release an active-low beam input
    pub fn clear_beam(&mut self, pin: u8) {
        self.set_level(pin, true);
    }

    pub fn set_level(&mut self, pin: u8, high: bool) {
        if let Some(level) = self.levels.get_mut(usize::from(pin)) {
            *level = high;
        }
    }

    /// Queue console input followed by a newline
    pub fn type_line(&mut self, line: &str) {
        for &byte in line.as_bytes().iter().chain(b"\n") {
            if self.input.push_back(byte).is_err() {
                break;
            }
        }
    }

    /// Most recent console line
    pub fn last_line(&self) -> Option<&str> {
        self.output.back().map(OutputLine::as_str)
    }

    /// Drop the recorded console output
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn relay(&self, relay: Relay) -> bool {
        self.relays[relay_index(relay)]
    }
}

const fn relay_index(relay: Relay) -> usize {
    match relay {
        Relay::Recorder => 0,
        Relay::Camera => 1,
        Relay::WorkLight => 2,
    }
}

impl BeamInputs for MockBoard {
    fn read(&mut self, pin: u8) -> bool {
        self.levels.get(usize::from(pin)).copied().unwrap_or(true)
    }
}

impl StatusLeds for MockBoard {
    fn write(&mut self, colors: &[Rgb]) {
        for (led, color) in self.leds.iter_mut().zip(colors) {
            *led = *color;
        }
        self.led_writes += 1;
    }
}

impl Buzzer for MockBoard {
    fn tone(&mut self, hz: u16) {
        self.tone = Some(hz);
        self.tone_writes += 1;
    }

    fn silence(&mut self) {
        self.tone = None;
        self.tone_writes += 1;
    }
}

impl Magnet for MockBoard {
    fn set_engaged(&mut self, engaged: bool) {
        self.magnet = engaged;
        self.magnet_writes += 1;
    }
}

impl TriggerLines for MockBoard {
    fn set_line(&mut self, channel: TriggerChannel, high: bool) {
        let idx = channel.index();
        if high && !self.trigger_lines[idx] {
            self.trigger_pulses[idx] += 1;
        }
        self.trigger_lines[idx] = high;
    }
}

impl RelayOutputs for MockBoard {
    fn set_relay(&mut self, relay: Relay, on: bool) {
        self.relays[relay_index(relay)] = on;
    }
}

impl ConsoleIo for MockBoard {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_line(&mut self, line: &str) {
        if self.output.is_full() {
            self.output.pop_front();
        }
        let mut stored = OutputLine::new();
        for c in line.chars() {
            if stored.push(c).is_err() {
                break;
            }
        }
        let _ = self.output.push_back(stored);
    }
}

impl SettingsStorage for MockBoard {
    fn load(&mut self, buf: &mut [u8]) -> bool {
        let Some(record) = &self.storage else {
            return false;
        };
        let len = buf.len().min(RECORD_LEN);
        buf[..len].copy_from_slice(&record[..len]);
        true
    }

    fn store(&mut self, buf: &[u8]) -> bool {
        if self.fail_writes || buf.len() != RECORD_LEN {
            return false;
        }
        let mut record = [0u8; RECORD_LEN];
        record.copy_from_slice(buf);
        self.storage = Some(record);
        true
    }
}

/// Recording alphanumeric display
#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    pub text: [u8; 4],
    pub brightness: u8,
    pub writes: u32,
    pub brightness_writes: u32,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self {
            text: *b"    ",
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.text).unwrap_or("????")
    }
}

impl AlphaDisplay for MockDisplay {
    fn write(&mut self, text: &[u8; 4]) {
        self.text = *text;
        self.writes += 1;
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        self.brightness_writes += 1;
    }
}
