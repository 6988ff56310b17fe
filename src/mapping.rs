//! Beam to scene mapping
//!
//! Beam indices are stable identifiers; rewiring a beam only changes its
//! pin entry, never which scene the index starts.

use crate::beam::{BEAM_COUNT, BeamConfig, REED_SLOT, SLOT_COUNT, UNUSED_PIN};
use crate::scene::SceneId;

/// One row of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamEntry {
    /// `None` disables the beam
    pub pin: Option<u8>,
    pub scene: SceneId,
}

/// Pin and scene for every beam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamMap {
    entries: [BeamEntry; BEAM_COUNT],
}

impl Default for BeamMap {
    fn default() -> Self {
        const fn entry(pin: u8, scene: SceneId) -> BeamEntry {
            BeamEntry {
                pin: Some(pin),
                scene,
            }
        }

        Self {
            entries: [
                entry(2, SceneId::FrankenLab),
                entry(3, SceneId::BloodRoom),
                entry(4, SceneId::Graveyard),
                entry(5, SceneId::FurRoom),
                entry(7, SceneId::OrcaDino),
                entry(9, SceneId::MirrorRoom),
            ],
        }
    }
}

impl BeamMap {
    pub const fn new(entries: [BeamEntry; BEAM_COUNT]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BeamEntry; BEAM_COUNT] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> Option<&BeamEntry> {
        self.entries.get(idx)
    }

    /// Scene started by beam `idx`
    ///
    /// Disabled beams and beams mapped to [`SceneId::Standby`] start
    /// nothing.
    pub fn scene_for(&self, idx: usize) -> Option<SceneId> {
        self.entries
            .get(idx)
            .filter(|entry| entry.pin.is_some() && entry.scene != SceneId::Standby)
            .map(|entry| entry.scene)
    }

    /// Returns `false` for an out-of-range index
    pub fn set_pin(&mut self, idx: usize, pin: Option<u8>) -> bool {
        match self.entries.get_mut(idx) {
            Some(entry) => {
                entry.pin = pin;
                true
            }
            None => false,
        }
    }

    /// Returns `false` for an out-of-range index
    pub fn set_scene(&mut self, idx: usize, scene: SceneId) -> bool {
        match self.entries.get_mut(idx) {
            Some(entry) => {
                entry.scene = scene;
                true
            }
            None => false,
        }
    }

    /// Pin column in persisted form
    pub fn raw_pins(&self) -> [u8; BEAM_COUNT] {
        self.entries.map(|entry| entry.pin.unwrap_or(UNUSED_PIN))
    }

    /// Scene column in persisted form
    pub fn raw_scenes(&self) -> [u8; BEAM_COUNT] {
        self.entries.map(|entry| entry.scene.code())
    }

    /// Build from the persisted columns. Fails on an unknown scene code.
    pub fn from_raw(pins: [u8; BEAM_COUNT], scenes: [u8; BEAM_COUNT]) -> Option<Self> {
        let mut entries = [BeamEntry {
            pin: None,
            scene: SceneId::Standby,
        }; BEAM_COUNT];
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.pin = BeamConfig::from_raw_pin(pins[idx]).pin;
            entry.scene = SceneId::from_code(scenes[idx])?;
        }
        Some(Self { entries })
    }

    /// Input wiring for the beam monitor, with the reed switch on its own
    /// slot
    pub fn beam_configs(&self, reed: Option<BeamConfig>) -> [BeamConfig; SLOT_COUNT] {
        let mut configs = [BeamConfig::default(); SLOT_COUNT];
        for (config, entry) in configs.iter_mut().zip(&self.entries) {
            *config = BeamConfig {
                pin: entry.pin,
                invert: false,
            };
        }
        configs[REED_SLOT] = reed.unwrap_or_default();
        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_columns_round_trip_defaults() {
        let map = BeamMap::default();
        assert_eq!(map.raw_pins(), [2, 3, 4, 5, 7, 9]);
        assert_eq!(BeamMap::from_raw(map.raw_pins(), map.raw_scenes()), Some(map));
    }

    #[test]
    fn test_disabled_and_standby_beams_start_nothing() {
        let mut map = BeamMap::default();
        assert!(map.set_pin(1, None));
        assert!(map.set_scene(2, SceneId::Standby));
        assert_eq!(map.scene_for(0), Some(SceneId::FrankenLab));
        assert_eq!(map.scene_for(1), None);
        assert_eq!(map.scene_for(2), None);
        assert_eq!(map.scene_for(6), None);
        assert!(!map.set_pin(6, Some(1)));
    }

    #[test]
    fn test_alias_codes_are_rejected() {
        let pins = [2, 3, 4, 5, 7, 9];
        assert!(BeamMap::from_raw(pins, [1, 2, 16, 13, 14, 15]).is_none());
        assert!(BeamMap::from_raw(pins, [1, 2, 17, 13, 14, 15]).is_none());
    }
}
