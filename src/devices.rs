//! Auxiliary devices on relays
//!
//! The recorder and the camera are plain power relays: the devices start
//! recording when they get power, so "record for N ms" is "power on and
//! switch off later". The work light follows the reed switch unless the
//! operator overrides it.

use embassy_time::{Duration, Instant};

use crate::director_log;
use crate::hardware::RelayOutputs;

/// Hold-off applied to the work light when the intro starts
pub const INTRO_LIGHT_KILL: Duration = Duration::from_millis(5_000);

/// Longest timed recording accepted from the console
pub const MAX_CAPTURE_MS: u32 = 600_000;

/// Relay output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Recorder,
    Camera,
    WorkLight,
}

impl Relay {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recorder => "REC",
            Self::Camera => "CAM",
            Self::WorkLight => "LIGHT",
        }
    }
}

/// A relay-powered recording device
#[derive(Debug, Clone)]
pub struct AuxRelay {
    relay: Relay,
    /// Whether the relay is wired at all
    present: bool,
    powered: bool,
    off_at: Option<Instant>,
}

impl AuxRelay {
    pub const fn new(relay: Relay, present: bool) -> Self {
        Self {
            relay,
            present,
            powered: false,
            off_at: None,
        }
    }

    pub const fn relay(&self) -> Relay {
        self.relay
    }

    pub const fn is_present(&self) -> bool {
        self.present
    }

    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    /// Force power on or off. Switching off cancels a timed recording.
    pub fn power<R: RelayOutputs>(&mut self, on: bool, out: &mut R) {
        self.powered = on;
        if !on {
            self.off_at = None;
        }
        if self.present {
            out.set_relay(self.relay, on);
        }
    }

    /// Power on now and off again after `duration`
    ///
    /// No-op when the relay is not wired.
    pub fn record_for<R: RelayOutputs>(
        &mut self,
        duration: Duration,
        out: &mut R,
        now: Instant,
    ) -> bool {
        if !self.present {
            return false;
        }
        self.powered = true;
        self.off_at = Some(now + duration);
        out.set_relay(self.relay, true);
        director_log!("[aux] {} recording {} ms", self.relay.as_str(), duration.as_millis());
        true
    }

    /// Switch off once a timed recording has run out
    pub fn service<R: RelayOutputs>(&mut self, out: &mut R, now: Instant) {
        if self.off_at.is_some_and(|off_at| now >= off_at) {
            self.off_at = None;
            self.powered = false;
            if self.present {
                out.set_relay(self.relay, false);
            }
        }
    }
}

/// Work light control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightMode {
    /// Follow the reed switch
    #[default]
    Auto,
    On,
    Off,
}

impl LightMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::On => "FORCE_ON",
            Self::Off => "FORCE_OFF",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [("AUTO", Self::Auto), ("ON", Self::On), ("OFF", Self::Off)]
            .into_iter()
            .find_map(|(name, mode)| name.eq_ignore_ascii_case(s).then_some(mode))
    }
}

/// Work light relay
#[derive(Debug, Clone, Default)]
pub struct WorkLight {
    mode: LightMode,
    killed_until: Option<Instant>,
    lit: Option<bool>,
}

impl WorkLight {
    pub const fn new() -> Self {
        Self {
            mode: LightMode::Auto,
            killed_until: None,
            lit: None,
        }
    }

    pub const fn mode(&self) -> LightMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LightMode) {
        self.mode = mode;
    }

    /// Keep the light dark for `duration` while in [`LightMode::Auto`]
    pub fn kill_for(&mut self, duration: Duration, now: Instant) {
        self.killed_until = Some(now + duration);
    }

    /// Last state written to the relay
    pub fn is_on(&self) -> bool {
        self.lit.unwrap_or(false)
    }

    /// Drive the relay from the mode and the reed switch
    pub fn service<R: RelayOutputs>(&mut self, reed_active: bool, out: &mut R, now: Instant) {
        if self.killed_until.is_some_and(|until| now >= until) {
            self.killed_until = None;
        }
        let lit = match self.mode {
            LightMode::On => true,
            LightMode::Off => false,
            LightMode::Auto => reed_active && self.killed_until.is_none(),
        };
        if self.lit != Some(lit) {
            out.set_relay(Relay::WorkLight, lit);
            self.lit = Some(lit);
        }
    }
}
