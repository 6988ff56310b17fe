//! Beam input monitor
//!
//! Polls the break-beam and reed inputs, debounces them, and turns a
//! debounced edge into "broken" into a one-shot event. A beam that fired
//! stays locked out until it has been stably clear for the re-arm delay.

use embassy_time::{Duration, Instant};

use crate::director_log;
use crate::hardware::BeamInputs;

/// Number of mapped beam zones (persisted in the settings record)
pub const BEAM_COUNT: usize = 6;

/// Beam slot used by the optional reed switch
pub const REED_SLOT: usize = BEAM_COUNT;

/// Total number of monitored slots (beams plus the reed switch)
pub const SLOT_COUNT: usize = BEAM_COUNT + 1;

/// Pin value used in persisted tables for "no pin assigned"
pub const UNUSED_PIN: u8 = 255;

/// Input wiring of one beam slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeamConfig {
    /// Physical pin, `None` excludes the slot from all processing
    pub pin: Option<u8>,
    /// The inputs are pulled up and read LOW when broken.
    /// `invert` flips that to "HIGH when broken".
    pub invert: bool,
}

impl BeamConfig {
    /// Active-low beam on `pin`
    pub const fn on_pin(pin: u8) -> Self {
        Self {
            pin: Some(pin),
            invert: false,
        }
    }

    /// Build from a persisted pin entry, mapping [`UNUSED_PIN`] to `None`
    pub const fn from_raw_pin(pin: u8) -> Self {
        Self {
            pin: if pin == UNUSED_PIN { None } else { Some(pin) },
            invert: false,
        }
    }

    /// Electrical level seen while the beam is clear
    const fn clear_level(self) -> bool {
        !self.invert
    }

    /// Map an electrical level to "broken"
    const fn is_broken_level(self, level: bool) -> bool {
        level == self.invert
    }
}

/// State of a single beam
#[derive(Debug, Clone)]
pub struct BeamSensor {
    config: BeamConfig,
    /// Last sampled electrical level
    raw: bool,
    /// Debounced logical state, `true` = broken
    broken: bool,
    /// Pending one-shot event
    triggered: bool,
    armed: bool,
    raw_changed_at: Instant,
    stable_changed_at: Instant,
    fired_at: Option<Instant>,
}

impl BeamSensor {
    /// A clear, armed sensor
    pub const fn new(config: BeamConfig, now: Instant) -> Self {
        Self {
            config,
            raw: config.clear_level(),
            broken: false,
            triggered: false,
            armed: true,
            raw_changed_at: now,
            stable_changed_at: now,
            fired_at: None,
        }
    }

    pub const fn config(&self) -> BeamConfig {
        self.config
    }

    /// Debounced state, `true` while the beam is broken
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether an event is waiting to be consumed
    pub const fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub const fn fired_at(&self) -> Option<Instant> {
        self.fired_at
    }

    /// Sample the input and advance debounce and re-arm state
    fn update(&mut self, level: bool, now: Instant, timing: BeamTiming) {
        if level != self.raw {
            self.raw = level;
            self.raw_changed_at = now;
        }

        let settled = now.saturating_duration_since(self.raw_changed_at) >= timing.debounce;
        if settled {
            let broken = self.config.is_broken_level(self.raw);
            if broken != self.broken {
                self.broken = broken;
                self.stable_changed_at = now;
                if broken && self.armed {
                    self.triggered = true;
                    self.armed = false;
                    self.fired_at = Some(now);
                }
            }
        }

        if !self.armed && !self.broken {
            let since = match self.fired_at {
                Some(fired_at) if fired_at > self.stable_changed_at => fired_at,
                _ => self.stable_changed_at,
            };
            if now.saturating_duration_since(since) >= timing.rearm {
                self.armed = true;
            }
        }
    }

    /// Return and clear the one-shot event
    fn consume(&mut self) -> bool {
        core::mem::take(&mut self.triggered)
    }
}

/// Debounce and re-arm delays shared by all beams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamTiming {
    /// Minimum settle time before a raw change is trusted
    pub debounce: Duration,
    /// Minimum clear time after a fire before the beam may fire again.
    /// Zero means no extra delay, not "never".
    pub rearm: Duration,
}

/// Monitors all beam slots
#[derive(Debug, Clone)]
pub struct BeamMonitor {
    sensors: [BeamSensor; SLOT_COUNT],
    timing: BeamTiming,
}

impl BeamMonitor {
    /// Bind the slots to their pins
    ///
    /// Slots with `pin: None` are permanently skipped.
    pub fn configure(configs: &[BeamConfig; SLOT_COUNT], timing: BeamTiming, now: Instant) -> Self {
        Self {
            sensors: core::array::from_fn(|idx| BeamSensor::new(configs[idx], now)),
            timing,
        }
    }

    pub const fn timing(&self) -> BeamTiming {
        self.timing
    }

    /// Change the debounce and re-arm delays. In-flight windows keep
    /// their start timestamps.
    pub fn set_timing(&mut self, timing: BeamTiming) {
        self.timing = timing;
    }

    /// Rebind one slot. The slot restarts clear and armed.
    ///
    /// Returns `false` for an out-of-range index.
    pub fn set_config(&mut self, idx: usize, config: BeamConfig, now: Instant) -> bool {
        let Some(sensor) = self.sensors.get_mut(idx) else {
            return false;
        };
        *sensor = BeamSensor::new(config, now);
        true
    }

    /// Poll every configured slot once
    pub fn tick<I: BeamInputs>(&mut self, inputs: &mut I, now: Instant) {
        let timing = self.timing;
        for (idx, sensor) in self.sensors.iter_mut().enumerate() {
            let Some(pin) = sensor.config.pin else {
                continue;
            };
            let level = inputs.read(pin);
            sensor.update(level, now, timing);
            if sensor.triggered && sensor.fired_at == Some(now) {
                director_log!("[beam] slot {} broken on pin {}", idx, pin);
            }
        }
    }

    /// Return and clear the one-shot event of slot `idx`
    ///
    /// Unused and out-of-range slots return `false`.
    pub fn consume_event(&mut self, idx: usize) -> bool {
        match self.sensors.get_mut(idx) {
            Some(sensor) if sensor.config.pin.is_some() => sensor.consume(),
            _ => false,
        }
    }

    /// Debounced state of slot `idx`
    pub fn is_broken(&self, idx: usize) -> bool {
        self.sensors.get(idx).is_some_and(BeamSensor::is_broken)
    }

    pub fn sensor(&self, idx: usize) -> Option<&BeamSensor> {
        self.sensors.get(idx)
    }

    pub fn sensors(&self) -> &[BeamSensor] {
        &self.sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Levels([bool; 16]);

    impl BeamInputs for Levels {
        fn read(&mut self, pin: u8) -> bool {
            self.0[usize::from(pin)]
        }
    }

    fn monitor(debounce: u64, rearm: u64) -> BeamMonitor {
        let mut configs = [BeamConfig::default(); SLOT_COUNT];
        configs[0] = BeamConfig::on_pin(2);
        BeamMonitor::configure(
            &configs,
            BeamTiming {
                debounce: Duration::from_millis(debounce),
                rearm: Duration::from_millis(rearm),
            },
            Instant::from_millis(0),
        )
    }

    fn run(monitor: &mut BeamMonitor, levels: &mut Levels, from: u64, to: u64) -> u32 {
        let mut events = 0;
        for ms in from..to {
            monitor.tick(levels, Instant::from_millis(ms));
            if monitor.consume_event(0) {
                events += 1;
            }
        }
        events
    }

    #[test]
    fn test_noise_inside_window_is_ignored() {
        let mut monitor = monitor(30, 0);
        let mut levels = Levels([true; 16]);
        for ms in 0..100 {
            levels.0[2] = ms % 10 < 5;
            monitor.tick(&mut levels, Instant::from_millis(ms));
            assert!(!monitor.consume_event(0));
        }
    }

    #[test]
    fn test_zero_rearm_fires_again_once_clear() {
        let mut monitor = monitor(5, 0);
        let mut levels = Levels([true; 16]);
        levels.0[2] = false;
        assert_eq!(run(&mut monitor, &mut levels, 0, 20), 1);
        levels.0[2] = true;
        assert_eq!(run(&mut monitor, &mut levels, 20, 40), 0);
        assert!(monitor.sensor(0).is_some_and(BeamSensor::is_armed));
        levels.0[2] = false;
        assert_eq!(run(&mut monitor, &mut levels, 40, 60), 1);
    }

    #[test]
    fn test_inverted_polarity() {
        let mut configs = [BeamConfig::default(); SLOT_COUNT];
        configs[REED_SLOT] = BeamConfig {
            pin: Some(3),
            invert: true,
        };
        let mut monitor = BeamMonitor::configure(
            &configs,
            BeamTiming {
                debounce: Duration::from_millis(10),
                rearm: Duration::from_millis(0),
            },
            Instant::from_millis(0),
        );
        let mut levels = Levels([false; 16]);
        monitor.tick(&mut levels, Instant::from_millis(50));
        assert!(!monitor.is_broken(REED_SLOT));
        levels.0[3] = true;
        monitor.tick(&mut levels, Instant::from_millis(60));
        monitor.tick(&mut levels, Instant::from_millis(70));
        assert!(monitor.is_broken(REED_SLOT));
        assert!(monitor.consume_event(REED_SLOT));
    }

    #[test]
    fn test_unused_slots_never_fire() {
        let mut monitor = monitor(0, 0);
        let mut levels = Levels([false; 16]);
        monitor.tick(&mut levels, Instant::from_millis(10));
        assert!(!monitor.consume_event(1));
        assert!(!monitor.consume_event(99));
        assert!(!monitor.is_broken(1));
    }
}
