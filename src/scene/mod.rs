//! Scene model
//!
//! Every scene is one closed [`SceneId`] with a static [`SceneProfile`]
//! describing how it looks and sounds. The [`SceneEngine`] drives the
//! active scene through its phases.

mod engine;
mod programs;

use embassy_time::Duration;

pub use engine::{Force, SceneEngine, SceneTimings, Transition, Transitions};

use crate::devices::Relay;
use crate::display::ProgramStep;
use crate::effect::{DRIP_TONE, HoldLook, MODEM_TONE, SILENT_TONE, ToneProgram};
use crate::trigger::TriggerChannel;

const SCENE_CODE_STANDBY: u8 = 0;
const SCENE_CODE_FRANKEN_LAB: u8 = 1;
const SCENE_CODE_MIRROR_ROOM: u8 = 2;
const SCENE_CODE_PHONE_LOADING: u8 = 10;
const SCENE_CODE_INTRO: u8 = 11;
const SCENE_CODE_BLOOD_ROOM: u8 = 12;
const SCENE_CODE_GRAVEYARD: u8 = 13;
const SCENE_CODE_FUR_ROOM: u8 = 14;
const SCENE_CODE_ORCA_DINO: u8 = 15;
const SCENE_CODE_EXIT_HOLE: u8 = 18;

const SCENE_NAME_STANDBY: &str = "STANDBY";
const SCENE_NAME_FRANKEN_LAB: &str = "FRANKENLAB";
const SCENE_NAME_MIRROR_ROOM: &str = "MIRRORROOM";
const SCENE_NAME_PHONE_LOADING: &str = "PHONELOADING";
const SCENE_NAME_INTRO: &str = "INTRO";
const SCENE_NAME_BLOOD_ROOM: &str = "BLOODROOM";
const SCENE_NAME_GRAVEYARD: &str = "GRAVEYARD";
const SCENE_NAME_FUR_ROOM: &str = "FURROOM";
const SCENE_NAME_ORCA_DINO: &str = "ORCADINO";
const SCENE_NAME_EXIT_HOLE: &str = "EXITHOLE";

/// Known scenes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SceneId {
    /// No scene. Forcing it returns the engine to idle.
    Standby = SCENE_CODE_STANDBY,
    FrankenLab = SCENE_CODE_FRANKEN_LAB,
    MirrorRoom = SCENE_CODE_MIRROR_ROOM,
    PhoneLoading = SCENE_CODE_PHONE_LOADING,
    Intro = SCENE_CODE_INTRO,
    BloodRoom = SCENE_CODE_BLOOD_ROOM,
    Graveyard = SCENE_CODE_GRAVEYARD,
    FurRoom = SCENE_CODE_FUR_ROOM,
    OrcaDino = SCENE_CODE_ORCA_DINO,
    ExitHole = SCENE_CODE_EXIT_HOLE,
}

impl SceneId {
    pub const ALL: [Self; 10] = [
        Self::Standby,
        Self::FrankenLab,
        Self::MirrorRoom,
        Self::PhoneLoading,
        Self::Intro,
        Self::BloodRoom,
        Self::Graveyard,
        Self::FurRoom,
        Self::OrcaDino,
        Self::ExitHole,
    ];

    /// Order of the automatic show
    pub const SEQUENCE: [Self; 8] = [
        Self::Intro,
        Self::BloodRoom,
        Self::Graveyard,
        Self::FurRoom,
        Self::OrcaDino,
        Self::FrankenLab,
        Self::MirrorRoom,
        Self::ExitHole,
    ];

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            SCENE_CODE_STANDBY => Self::Standby,
            SCENE_CODE_FRANKEN_LAB => Self::FrankenLab,
            SCENE_CODE_MIRROR_ROOM => Self::MirrorRoom,
            SCENE_CODE_PHONE_LOADING => Self::PhoneLoading,
            SCENE_CODE_INTRO => Self::Intro,
            SCENE_CODE_BLOOD_ROOM => Self::BloodRoom,
            SCENE_CODE_GRAVEYARD => Self::Graveyard,
            SCENE_CODE_FUR_ROOM => Self::FurRoom,
            SCENE_CODE_ORCA_DINO => Self::OrcaDino,
            SCENE_CODE_EXIT_HOLE => Self::ExitHole,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standby => SCENE_NAME_STANDBY,
            Self::FrankenLab => SCENE_NAME_FRANKEN_LAB,
            Self::MirrorRoom => SCENE_NAME_MIRROR_ROOM,
            Self::PhoneLoading => SCENE_NAME_PHONE_LOADING,
            Self::Intro => SCENE_NAME_INTRO,
            Self::BloodRoom => SCENE_NAME_BLOOD_ROOM,
            Self::Graveyard => SCENE_NAME_GRAVEYARD,
            Self::FurRoom => SCENE_NAME_FUR_ROOM,
            Self::OrcaDino => SCENE_NAME_ORCA_DINO,
            Self::ExitHole => SCENE_NAME_EXIT_HOLE,
        }
    }

    /// Parse a scene name (case-insensitive) or numeric code
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|scene| scene.as_str().eq_ignore_ascii_case(s))
    }

    /// Scene that follows this one in the automatic show
    pub fn next_in_sequence(self) -> Self {
        let position = Self::SEQUENCE.iter().position(|scene| *scene == self);
        match position {
            Some(idx) => Self::SEQUENCE[(idx + 1) % Self::SEQUENCE.len()],
            None => Self::SEQUENCE[0],
        }
    }

    /// Look and sound of the scene, `None` for [`SceneId::Standby`]
    pub fn profile(self) -> Option<&'static SceneProfile> {
        Some(match self {
            Self::Standby => return None,
            Self::FrankenLab => &FRANKEN_LAB,
            Self::MirrorRoom => &MIRROR_ROOM,
            Self::PhoneLoading => &PHONE_LOADING,
            Self::Intro => &INTRO,
            Self::BloodRoom => &BLOOD_ROOM,
            Self::Graveyard => &GRAVEYARD,
            Self::FurRoom => &FUR_ROOM,
            Self::OrcaDino => &ORCA_DINO,
            Self::ExitHole => &EXIT_HOLE,
        })
    }
}

/// Phase of the active scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Hold,
    Cooldown,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Hold => "HOLD",
            Self::Cooldown => "COOLDOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [Self::Idle, Self::Hold, Self::Cooldown]
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
    }
}

/// How scenes get started
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShowMode {
    /// Show stopped, beams are ignored
    Standby,
    /// Each beam starts its mapped scene
    #[default]
    Triggered,
    /// Scenes follow [`SceneId::SEQUENCE`] back to back
    Sequence,
    /// The media player runs its attract loop, beams are ignored
    Attract,
}

impl ShowMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standby => "STANDBY",
            Self::Triggered => "TRIGGER",
            Self::Sequence => "SEQUENCE",
            Self::Attract => "ATTRACT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("TRIGGERED") {
            return Some(Self::Triggered);
        }
        [Self::Standby, Self::Triggered, Self::Sequence, Self::Attract]
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
    }

    /// Mode selected by a keypad key
    pub const fn from_key(key: u8) -> Option<Self> {
        match key {
            b'1' => Some(Self::Sequence),
            b'2' => Some(Self::Standby),
            b'3' => Some(Self::Triggered),
            b'4' => Some(Self::Attract),
            _ => None,
        }
    }

    /// Show-control line pulsed when the director switches to this mode
    pub const fn cue(self) -> TriggerChannel {
        match self {
            Self::Standby => TriggerChannel::StopAll,
            Self::Triggered => TriggerChannel::StartTrigger,
            Self::Sequence => TriggerChannel::StartLoop,
            Self::Attract => TriggerChannel::StartAttract,
        }
    }
}

/// Static description of a scene
#[derive(Debug)]
pub struct SceneProfile {
    /// Display owner tag, also the banner text
    pub tag: &'static str,
    /// Display priority, higher preempts lower
    pub priority: u8,
    /// Display brightness while the scene owns it
    pub brightness: u8,
    pub look: HoldLook,
    pub tone: ToneProgram,
    /// Engage the magnet lock during hold
    pub magnet: bool,
    pub program: &'static [ProgramStep],
    /// Show-control cue pulsed when the hold starts
    pub cue: Option<TriggerChannel>,
    /// Recording device started when the hold starts
    pub capture: Option<Relay>,
}

const fn strobe(ms: u64) -> HoldLook {
    HoldLook::Strobe {
        period: Duration::from_millis(ms),
    }
}

const fn pulse(ms: u64) -> HoldLook {
    HoldLook::Pulse {
        period: Duration::from_millis(ms),
    }
}

static FRANKEN_LAB: SceneProfile = SceneProfile {
    tag: "FRNK",
    priority: 10,
    brightness: 15,
    look: HoldLook::Stutter,
    tone: MODEM_TONE,
    magnet: true,
    program: programs::SKIMMER,
    cue: Some(TriggerChannel::Franken),
    capture: Some(Relay::Camera),
};

static MIRROR_ROOM: SceneProfile = SceneProfile {
    tag: "MIRR",
    priority: 8,
    brightness: 12,
    look: strobe(200),
    tone: SILENT_TONE,
    magnet: false,
    program: programs::MIRROR_BANNER,
    cue: None,
    capture: None,
};

static PHONE_LOADING: SceneProfile = SceneProfile {
    tag: "PHON",
    priority: 10,
    brightness: 15,
    look: HoldLook::Stutter,
    tone: MODEM_TONE,
    magnet: true,
    program: programs::SKIMMER,
    cue: None,
    capture: None,
};

static INTRO: SceneProfile = SceneProfile {
    tag: "INTR",
    priority: 12,
    brightness: 12,
    look: pulse(1_200),
    tone: SILENT_TONE,
    magnet: false,
    program: programs::INTRO_BANNER,
    cue: Some(TriggerChannel::Show),
    capture: Some(Relay::Recorder),
};

static BLOOD_ROOM: SceneProfile = SceneProfile {
    tag: "BLOD",
    priority: 9,
    brightness: 12,
    look: pulse(1_600),
    tone: DRIP_TONE,
    magnet: false,
    program: programs::BLOOD_BANNER,
    cue: Some(TriggerChannel::Blood),
    capture: None,
};

static GRAVEYARD: SceneProfile = SceneProfile {
    tag: "GRAV",
    priority: 9,
    brightness: 10,
    look: pulse(2_400),
    tone: SILENT_TONE,
    magnet: false,
    program: programs::GRAVEYARD_BANNER,
    cue: Some(TriggerChannel::Grave),
    capture: None,
};

static FUR_ROOM: SceneProfile = SceneProfile {
    tag: "FUR",
    priority: 9,
    brightness: 12,
    look: HoldLook::Stutter,
    tone: SILENT_TONE,
    magnet: false,
    program: programs::FUR_BANNER,
    cue: Some(TriggerChannel::Fur),
    capture: None,
};

static ORCA_DINO: SceneProfile = SceneProfile {
    tag: "ORCA",
    priority: 9,
    brightness: 12,
    look: pulse(900),
    tone: SILENT_TONE,
    magnet: false,
    program: programs::ORCA_BANNER,
    cue: None,
    capture: None,
};

static EXIT_HOLE: SceneProfile = SceneProfile {
    tag: "EXIT",
    priority: 11,
    brightness: 15,
    look: strobe(120),
    tone: SILENT_TONE,
    magnet: false,
    program: programs::EXIT_BANNER,
    cue: None,
    capture: None,
};
