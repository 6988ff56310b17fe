//! Hardware ports
//!
//! The director never touches pins directly. A board support layer
//! implements these traits for the real peripherals (GPIO, I2C backpack,
//! PWM, relays) and [`crate::mock`] implements them for tests and the
//! desktop preview.

use crate::Rgb;
use crate::devices::Relay;
use crate::trigger::TriggerChannel;

/// Raw digital inputs used by the beam monitor
pub trait BeamInputs {
    /// Read the electrical level of `pin` (`true` = HIGH)
    fn read(&mut self, pin: u8) -> bool;
}

/// The single shared 4-character alphanumeric display
pub trait AlphaDisplay {
    /// Render four ASCII characters
    fn write(&mut self, text: &[u8; 4]);

    /// Set the display brightness (0-15)
    fn set_brightness(&mut self, level: u8);
}

/// Status LED strip
///
/// The frame always holds [`crate::effect::STATUS_LED_COUNT`] pixels in
/// the order armed (green), hold (red), cooldown (yellow).
pub trait StatusLeds {
    /// Write colors to the LEDs
    fn write(&mut self, colors: &[Rgb]);
}

/// Passive piezo buzzer
pub trait Buzzer {
    /// Start (or retune) a square-wave tone
    fn tone(&mut self, hz: u16);

    /// Stop any tone
    fn silence(&mut self);
}

/// Electromagnet lock driver
pub trait Magnet {
    fn set_engaged(&mut self, engaged: bool);
}

/// Output lines of the show-control trigger bus
pub trait TriggerLines {
    fn set_line(&mut self, channel: TriggerChannel, high: bool);
}

/// Relay outputs for auxiliary devices
pub trait RelayOutputs {
    fn set_relay(&mut self, relay: Relay, on: bool);
}

/// Line-oriented operator console
pub trait ConsoleIo {
    /// Non-blocking read of one received byte
    fn read_byte(&mut self) -> Option<u8>;

    /// Write one reply line (the implementation appends the line ending)
    fn write_line(&mut self, line: &str);
}

/// Backing store for the persisted settings record
pub trait SettingsStorage {
    /// Fill `buf` from storage. Returns `false` if nothing could be read.
    fn load(&mut self, buf: &mut [u8]) -> bool;

    /// Persist `buf`. Returns `false` if the write failed.
    fn store(&mut self, buf: &[u8]) -> bool;
}

/// Every port the director drives besides the shared display
pub trait Board:
    BeamInputs
    + StatusLeds
    + Buzzer
    + Magnet
    + TriggerLines
    + RelayOutputs
    + ConsoleIo
    + SettingsStorage
{
}

impl<T> Board for T where
    T: BeamInputs
        + StatusLeds
        + Buzzer
        + Magnet
        + TriggerLines
        + RelayOutputs
        + ConsoleIo
        + SettingsStorage
{
}
