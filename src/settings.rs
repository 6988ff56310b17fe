//! Persisted settings record
//!
//! # Record format (little-endian)
//!
//! ```text
//! ┌────────────────────────────────┐
//! │ Magic: u16 = 0x4848            │  Offset: 0
//! │ Version: u8 = 2                │  Offset: 2
//! │ Hold ms: u32                   │  Offset: 3
//! │ Cooldown ms: u32               │  Offset: 7
//! │ Debounce ms: u16               │  Offset: 11
//! │ Re-arm ms: u32                 │  Offset: 13
//! │ Brightness: u8                 │  Offset: 17
//! │ Beam pins: [u8; 6] (255 = off) │  Offset: 18
//! │ Beam scene codes: [u8; 6]      │  Offset: 24
//! │ CRC-32 of bytes 0..30: u32     │  Offset: 30
//! └────────────────────────────────┘
//! ```
//!
//! A record that fails any check is never applied; the caller falls
//! back to [`Settings::default`].

use core::fmt;

use embassy_time::Duration;

use crate::beam::{BEAM_COUNT, BeamTiming};
use crate::director_log;
use crate::display::MAX_BRIGHTNESS;
use crate::hardware::SettingsStorage;
use crate::mapping::BeamMap;
use crate::scene::SceneTimings;

const SETTINGS_MAGIC: u16 = 0x4848;
const SETTINGS_VERSION: u8 = 2;

/// Encoded record length
pub const RECORD_LEN: usize = 34;

const CRC_OFFSET: usize = RECORD_LEN - 4;

/// Longest accepted hold or cooldown
pub const MAX_PHASE_MS: u32 = 600_000;
/// Longest accepted debounce window
pub const MAX_DEBOUNCE_MS: u16 = 2_000;
/// Longest accepted re-arm delay
pub const MAX_REARM_MS: u32 = 600_000;

const CRC32: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Why a settings record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Nothing could be read, or the record is too short
    Unreadable,
    BadMagic,
    BadVersion,
    BadChecksum,
    /// A field is outside its accepted range
    OutOfRange,
    /// A beam is mapped to an unknown scene code
    UnknownScene,
    /// The storage refused the write
    WriteFailed,
}

impl SettingsError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unreadable => "unreadable",
            Self::BadMagic => "bad magic",
            Self::BadVersion => "bad version",
            Self::BadChecksum => "bad checksum",
            Self::OutOfRange => "out of range",
            Self::UnknownScene => "unknown scene",
            Self::WriteFailed => "write failed",
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-tunable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub hold_ms: u32,
    pub cooldown_ms: u32,
    pub debounce_ms: u16,
    pub rearm_ms: u32,
    /// Idle display brightness (0-15)
    pub brightness: u8,
    pub map: BeamMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hold_ms: 5_000,
            cooldown_ms: 20_000,
            debounce_ms: 30,
            rearm_ms: 20_000,
            brightness: 10,
            map: BeamMap::default(),
        }
    }
}

impl Settings {
    /// Check every field against its range
    pub fn validate(&self) -> Result<(), SettingsError> {
        let in_range = self.hold_ms <= MAX_PHASE_MS
            && self.cooldown_ms <= MAX_PHASE_MS
            && self.debounce_ms <= MAX_DEBOUNCE_MS
            && self.rearm_ms <= MAX_REARM_MS
            && self.brightness <= MAX_BRIGHTNESS;
        if in_range {
            Ok(())
        } else {
            Err(SettingsError::OutOfRange)
        }
    }

    pub fn scene_timings(&self) -> SceneTimings {
        SceneTimings {
            hold: Duration::from_millis(u64::from(self.hold_ms)),
            cooldown: Duration::from_millis(u64::from(self.cooldown_ms)),
        }
    }

    pub fn beam_timing(&self) -> BeamTiming {
        BeamTiming {
            debounce: Duration::from_millis(u64::from(self.debounce_ms)),
            rearm: Duration::from_millis(u64::from(self.rearm_ms)),
        }
    }

    /// Serialize into the persisted record
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..2].copy_from_slice(&SETTINGS_MAGIC.to_le_bytes());
        buf[2] = SETTINGS_VERSION;
        buf[3..7].copy_from_slice(&self.hold_ms.to_le_bytes());
        buf[7..11].copy_from_slice(&self.cooldown_ms.to_le_bytes());
        buf[11..13].copy_from_slice(&self.debounce_ms.to_le_bytes());
        buf[13..17].copy_from_slice(&self.rearm_ms.to_le_bytes());
        buf[17] = self.brightness;
        buf[18..24].copy_from_slice(&self.map.raw_pins());
        buf[24..30].copy_from_slice(&self.map.raw_scenes());
        let crc = CRC32.checksum(&buf[..CRC_OFFSET]);
        buf[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Parse and validate a persisted record
    pub fn decode(buf: &[u8]) -> Result<Self, SettingsError> {
        let Some(buf) = buf.get(..RECORD_LEN) else {
            return Err(SettingsError::Unreadable);
        };
        if u16::from_le_bytes([buf[0], buf[1]]) != SETTINGS_MAGIC {
            return Err(SettingsError::BadMagic);
        }
        if buf[2] != SETTINGS_VERSION {
            return Err(SettingsError::BadVersion);
        }
        let stored_crc = u32::from_le_bytes([
            buf[CRC_OFFSET],
            buf[CRC_OFFSET + 1],
            buf[CRC_OFFSET + 2],
            buf[CRC_OFFSET + 3],
        ]);
        if stored_crc != CRC32.checksum(&buf[..CRC_OFFSET]) {
            return Err(SettingsError::BadChecksum);
        }

        let mut pins = [0u8; BEAM_COUNT];
        pins.copy_from_slice(&buf[18..24]);
        let mut scenes = [0u8; BEAM_COUNT];
        scenes.copy_from_slice(&buf[24..30]);
        let map = BeamMap::from_raw(pins, scenes).ok_or(SettingsError::UnknownScene)?;

        let settings = Self {
            hold_ms: u32::from_le_bytes([buf[3], buf[4], buf[5], buf[6]]),
            cooldown_ms: u32::from_le_bytes([buf[7], buf[8], buf[9], buf[10]]),
            debounce_ms: u16::from_le_bytes([buf[11], buf[12]]),
            rearm_ms: u32::from_le_bytes([buf[13], buf[14], buf[15], buf[16]]),
            brightness: buf[17],
            map,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Read and decode the record from `storage`
    pub fn load<S: SettingsStorage>(storage: &mut S) -> Result<Self, SettingsError> {
        let mut buf = [0u8; RECORD_LEN];
        if !storage.load(&mut buf) {
            return Err(SettingsError::Unreadable);
        }
        Self::decode(&buf)
    }

    /// Like [`Settings::load`], falling back to the defaults
    pub fn load_or_default<S: SettingsStorage>(storage: &mut S) -> Self {
        match Self::load(storage) {
            Ok(settings) => settings,
            Err(err) => {
                director_log!("[settings] {}, using defaults", err);
                Self::default()
            }
        }
    }

    /// Encode and write the record to `storage`
    pub fn save<S: SettingsStorage>(&self, storage: &mut S) -> Result<(), SettingsError> {
        self.validate()?;
        if storage.store(&self.encode()) {
            Ok(())
        } else {
            Err(SettingsError::WriteFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let buf = Settings::default().encode();
        assert_eq!(&buf[0..3], &[0x48, 0x48, 2]);
        assert_eq!(&buf[3..7], &5_000u32.to_le_bytes());
        assert_eq!(&buf[18..24], &[2, 3, 4, 5, 7, 9]);
        assert_eq!(&buf[24..30], &[1, 12, 13, 14, 15, 2]);
    }

    #[test]
    fn test_decode_rejects_damage() {
        let good = Settings::default().encode();

        let mut bad_magic = good;
        bad_magic[0] = 0;
        assert_eq!(Settings::decode(&bad_magic), Err(SettingsError::BadMagic));

        let mut bad_version = good;
        bad_version[2] = 1;
        assert_eq!(Settings::decode(&bad_version), Err(SettingsError::BadVersion));

        let mut flipped = good;
        flipped[5] ^= 0x01;
        assert_eq!(Settings::decode(&flipped), Err(SettingsError::BadChecksum));

        assert_eq!(Settings::decode(&good[..10]), Err(SettingsError::Unreadable));
    }

    #[test]
    fn test_decode_rejects_out_of_range_with_valid_crc() {
        let settings = Settings {
            brightness: 16,
            ..Settings::default()
        };
        assert_eq!(Settings::decode(&settings.encode()), Err(SettingsError::OutOfRange));
    }
}
