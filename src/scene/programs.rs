//! Display programs played during hold

use embassy_time::Duration;

use crate::display::ProgramStep;

const fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Fake card skimmer: flashing dashes, a scrolled warning, then a
/// "stolen" card number, expiry, PIN and area code
pub(super) const SKIMMER: &[ProgramStep] = &[
    ProgramStep::Blink {
        text: "----",
        toggles: 12,
        period: ms(150),
    },
    ProgramStep::Scroll {
        message: "SECURING ENCRYPTED DATA",
        step: ms(180),
    },
    ProgramStep::Digits {
        count: 16,
        dwell: ms(400),
    },
    ProgramStep::Text {
        text: "DATE",
        dwell: ms(500),
    },
    ProgramStep::Expiry { dwell: ms(700) },
    ProgramStep::Text {
        text: "PIN ",
        dwell: ms(500),
    },
    ProgramStep::Digits {
        count: 3,
        dwell: ms(700),
    },
    ProgramStep::Text {
        text: "AREA",
        dwell: ms(500),
    },
    ProgramStep::Digits {
        count: 5,
        dwell: ms(600),
    },
];

/// Flash the scene tag, then scroll the scene name
const fn banner(tag: &'static str, name: &'static str) -> [ProgramStep; 3] {
    [
        ProgramStep::Blink {
            text: tag,
            toggles: 6,
            period: ms(200),
        },
        ProgramStep::Scroll {
            message: name,
            step: ms(200),
        },
        ProgramStep::Text {
            text: tag,
            dwell: ms(1_000),
        },
    ]
}

const MIRROR: [ProgramStep; 3] = banner("MIRR", "MIRROR ROOM");
const INTRO: [ProgramStep; 3] = banner("INTR", "WELCOME ABOARD");
const BLOOD: [ProgramStep; 3] = banner("BLOD", "BLOOD ROOM");
const GRAVEYARD: [ProgramStep; 3] = banner("GRAV", "GRAVEYARD");
const FUR: [ProgramStep; 3] = banner("FUR", "FUR ROOM");
const ORCA: [ProgramStep; 3] = banner("ORCA", "ORCA DINO");
const EXIT: [ProgramStep; 3] = banner("EXIT", "EXIT THIS WAY");

pub(super) const MIRROR_BANNER: &[ProgramStep] = &MIRROR;
pub(super) const INTRO_BANNER: &[ProgramStep] = &INTRO;
pub(super) const BLOOD_BANNER: &[ProgramStep] = &BLOOD;
pub(super) const GRAVEYARD_BANNER: &[ProgramStep] = &GRAVEYARD;
pub(super) const FUR_BANNER: &[ProgramStep] = &FUR;
pub(super) const ORCA_BANNER: &[ProgramStep] = &ORCA;
pub(super) const EXIT_BANNER: &[ProgramStep] = &EXIT;
