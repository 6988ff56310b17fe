//! Operator console
//!
//! Bytes from [`ConsoleIo`] are assembled into lines, each line is parsed
//! into a [`Command`]. Parsing checks every range up front, so a rejected
//! command never touches any state.

use core::fmt;
use core::str::SplitAsciiWhitespace;

use heapless::{String, Vec};

use crate::beam::{BEAM_COUNT, UNUSED_PIN};
use crate::devices::{LightMode, MAX_CAPTURE_MS};
use crate::display::MAX_BRIGHTNESS;
use crate::hardware::ConsoleIo;
use crate::scene::{Phase, SceneId, ShowMode};
use crate::settings::{MAX_DEBOUNCE_MS, MAX_PHASE_MS, MAX_REARM_MS, SettingsError};
use crate::telemetry::{MAX_INTERVAL_MS, MIN_INTERVAL_MS};
use crate::trigger::TriggerChannel;

/// Longest line kept; older characters are dropped
pub const MAX_LINE_LEN: usize = 80;

/// Bytes read from the console per tick
pub const BYTES_PER_TICK: usize = 64;

/// One assembled input line
pub type Line = String<MAX_LINE_LEN>;

/// Collects console bytes into lines
#[derive(Debug, Default)]
pub struct LineReader {
    buf: Vec<u8, MAX_LINE_LEN>,
}

impl LineReader {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one byte, returning a line when `\n` completes it
    ///
    /// `\r` is ignored. When the line outgrows the buffer, the oldest
    /// character is dropped so the tail survives. Non-ASCII bytes are
    /// replaced with `?`.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let mut line = Line::new();
                for &b in &self.buf {
                    // Capacities match, the push cannot fail
                    let _ = line.push(char::from(b));
                }
                self.buf.clear();
                Some(line)
            }
            _ => {
                if self.buf.is_full() {
                    self.buf.remove(0);
                }
                let byte = if byte.is_ascii() { byte } else { b'?' };
                let _ = self.buf.push(byte);
                None
            }
        }
    }

    /// Read up to [`BYTES_PER_TICK`] bytes, stopping at the first
    /// complete line
    pub fn poll<C: ConsoleIo>(&mut self, io: &mut C) -> Option<Line> {
        for _ in 0..BYTES_PER_TICK {
            let byte = io.read_byte()?;
            if let Some(line) = self.push(byte) {
                return Some(line);
            }
        }
        None
    }
}

/// Power or timed capture request for a recording relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    On,
    Off,
    For(u32),
}

/// Parsed operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Config,
    Map,
    Version,
    Hold(u32),
    Cooldown(u32),
    Debounce(u16),
    Rearm(u32),
    Brightness(u8),
    State(Phase),
    Scene(SceneId),
    Save,
    Load,
    Reset,
    BeamPin { beam: usize, pin: Option<u8> },
    BeamScene { beam: usize, scene: SceneId },
    Log(bool),
    Recorder(Capture),
    Camera(Capture),
    Trigger(TriggerChannel),
    Light(LightMode),
    Mode(ShowMode),
    /// Telemetry interval in milliseconds, `None` switches it off
    Telemetry(Option<u32>),
}

/// Why a command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown,
    MissingArgument,
    /// Extra tokens after a complete command
    TrailingArgument,
    BadNumber,
    OutOfRange,
    BadBeam,
    UnknownScene,
    UnknownChannel,
    BadValue,
    /// The trigger channel is still pulsing or locked out
    Busy,
    /// The relay for the device is not wired
    NoDevice,
    Settings(SettingsError),
}

impl CommandError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Unknown => "unknown command",
            Self::MissingArgument => "missing argument",
            Self::TrailingArgument => "too many arguments",
            Self::BadNumber => "bad number",
            Self::OutOfRange => "out of range",
            Self::BadBeam => "bad beam index",
            Self::UnknownScene => "unknown scene",
            Self::UnknownChannel => "unknown channel",
            Self::BadValue => "bad value",
            Self::Busy => "busy",
            Self::NoDevice => "no device",
            Self::Settings(err) => err.as_str(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SettingsError> for CommandError {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

struct Args<'a> {
    tokens: SplitAsciiWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Result<&'a str, CommandError> {
        self.tokens.next().ok_or(CommandError::MissingArgument)
    }

    fn number<T: core::str::FromStr + PartialOrd>(&mut self, max: T) -> Result<T, CommandError> {
        let value: T = self.next()?.parse().map_err(|_| CommandError::BadNumber)?;
        if value > max {
            return Err(CommandError::OutOfRange);
        }
        Ok(value)
    }

    fn beam(&mut self) -> Result<usize, CommandError> {
        let idx: usize = self.next()?.parse().map_err(|_| CommandError::BadBeam)?;
        if idx < BEAM_COUNT {
            Ok(idx)
        } else {
            Err(CommandError::BadBeam)
        }
    }

    fn switch(&mut self) -> Result<bool, CommandError> {
        let token = self.next()?;
        if token.eq_ignore_ascii_case("ON") {
            Ok(true)
        } else if token.eq_ignore_ascii_case("OFF") {
            Ok(false)
        } else {
            Err(CommandError::BadValue)
        }
    }

    fn capture(&mut self) -> Result<Capture, CommandError> {
        let token = self.next()?;
        if token.eq_ignore_ascii_case("ON") {
            return Ok(Capture::On);
        }
        if token.eq_ignore_ascii_case("OFF") {
            return Ok(Capture::Off);
        }
        let ms: u32 = token.parse().map_err(|_| CommandError::BadValue)?;
        if (1..=MAX_CAPTURE_MS).contains(&ms) {
            Ok(Capture::For(ms))
        } else {
            Err(CommandError::OutOfRange)
        }
    }

    fn interval(&mut self) -> Result<Option<u32>, CommandError> {
        let token = self.next()?;
        if token.eq_ignore_ascii_case("OFF") {
            return Ok(None);
        }
        let ms: u32 = token.parse().map_err(|_| CommandError::BadValue)?;
        if (MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&ms) {
            Ok(Some(ms))
        } else {
            Err(CommandError::OutOfRange)
        }
    }

    fn finish(mut self, command: Command) -> Result<Command, CommandError> {
        match self.tokens.next() {
            Some(_) => Err(CommandError::TrailingArgument),
            None => Ok(command),
        }
    }
}

impl Command {
    /// Parse one console line. Keywords are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_ascii_whitespace();
        let keyword = tokens.next().ok_or(CommandError::Empty)?;
        let mut args = Args { tokens };
        let upper = Keyword::new(keyword);

        let command = match upper.as_str() {
            "?" | "HELP" => Self::Help,
            "CFG" => Self::Config,
            "MAP" => Self::Map,
            "VER" => Self::Version,
            "HOLD" => Self::Hold(args.number(MAX_PHASE_MS)?),
            "COOL" => Self::Cooldown(args.number(MAX_PHASE_MS)?),
            "SDEB" => Self::Debounce(args.number(MAX_DEBOUNCE_MS)?),
            "SREARM" => Self::Rearm(args.number(MAX_REARM_MS)?),
            "BRIGHT" => Self::Brightness(args.number(MAX_BRIGHTNESS)?),
            "STATE" => Self::State(Phase::parse(args.next()?).ok_or(CommandError::BadValue)?),
            "SCENE" => Self::Scene(SceneId::parse(args.next()?).ok_or(CommandError::UnknownScene)?),
            "SAVE" => Self::Save,
            "LOAD" => Self::Load,
            "RESET" => Self::Reset,
            "BMAP" => {
                let beam = args.beam()?;
                let token = args.next()?;
                let pin = if token.eq_ignore_ascii_case("NONE") {
                    None
                } else {
                    let pin: u8 = token.parse().map_err(|_| CommandError::BadNumber)?;
                    if pin == UNUSED_PIN {
                        return Err(CommandError::OutOfRange);
                    }
                    Some(pin)
                };
                Self::BeamPin { beam, pin }
            }
            "BSCENE" => {
                let beam = args.beam()?;
                let scene = SceneId::parse(args.next()?).ok_or(CommandError::UnknownScene)?;
                Self::BeamScene { beam, scene }
            }
            "LOG" => Self::Log(args.switch()?),
            "REC" => Self::Recorder(args.capture()?),
            "CAM" => Self::Camera(args.capture()?),
            "TRIG" => {
                let channel = TriggerChannel::parse(args.next()?);
                Self::Trigger(channel.ok_or(CommandError::UnknownChannel)?)
            }
            "LIGHT" => Self::Light(LightMode::parse(args.next()?).ok_or(CommandError::BadValue)?),
            "MODE" => Self::Mode(ShowMode::parse(args.next()?).ok_or(CommandError::BadValue)?),
            "TEL" => Self::Telemetry(args.interval()?),
            _ => return Err(CommandError::Unknown),
        };
        args.finish(command)
    }

    /// Command bound to a keypad key
    pub fn from_key(key: u8) -> Option<Self> {
        ShowMode::from_key(key).map(Self::Mode)
    }

    /// Keyword echoed in the `OK` reply
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Config => "CFG",
            Self::Map => "MAP",
            Self::Version => "VER",
            Self::Hold(_) => "HOLD",
            Self::Cooldown(_) => "COOL",
            Self::Debounce(_) => "SDEB",
            Self::Rearm(_) => "SREARM",
            Self::Brightness(_) => "BRIGHT",
            Self::State(_) => "STATE",
            Self::Scene(_) => "SCENE",
            Self::Save => "SAVE",
            Self::Load => "LOAD",
            Self::Reset => "RESET",
            Self::BeamPin { .. } => "BMAP",
            Self::BeamScene { .. } => "BSCENE",
            Self::Log(_) => "LOG",
            Self::Recorder(_) => "REC",
            Self::Camera(_) => "CAM",
            Self::Trigger(_) => "TRIG",
            Self::Light(_) => "LIGHT",
            Self::Mode(_) => "MODE",
            Self::Telemetry(_) => "TEL",
        }
    }
}

/// Upper-cased copy of a keyword; anything too long is unknown
struct Keyword(String<8>);

impl Keyword {
    fn new(token: &str) -> Self {
        let mut upper = String::new();
        for c in token.chars() {
            if upper.push(c.to_ascii_uppercase()).is_err() {
                return Self(String::new());
            }
        }
        Self(upper)
    }

    fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Help text, one reply line each
pub const HELP_LINES: &[&str] = &[
    "? | HELP              this list",
    "CFG | MAP | VER       show settings, beam map, version",
    "HOLD|COOL <ms>        phase durations (0-600000)",
    "SDEB <ms>             debounce (0-2000)",
    "SREARM <ms>           re-arm delay (0-600000)",
    "BRIGHT <0-15>         idle display brightness",
    "STATE IDLE|HOLD|COOLDOWN",
    "SCENE <name|code>     start a scene",
    "SAVE | LOAD | RESET   persisted settings",
    "BMAP <idx> <pin|NONE> beam pin",
    "BSCENE <idx> <scene>  beam scene",
    "LOG ON|OFF",
    "REC|CAM ON|OFF|<ms>   recorder / camera",
    "TRIG <name|idx>       pulse a show cue",
    "LIGHT ON|OFF|AUTO     work light",
    "MODE STANDBY|TRIGGER|SEQUENCE|ATTRACT",
    "TEL OFF|<ms>          telemetry frames (10-60000)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_keeps_tail() {
        let mut reader = LineReader::new();
        for _ in 0..100 {
            assert!(reader.push(b'x').is_none());
        }
        for &b in b"HOLD 1\r" {
            assert!(reader.push(b).is_none());
        }
        let line = reader.push(b'\n');
        assert!(line.as_ref().is_some_and(|l| l.len() == MAX_LINE_LEN));
        assert!(line.is_some_and(|l| l.ends_with("HOLD 1")));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Command::parse("hold 4000"), Ok(Command::Hold(4000)));
        assert_eq!(Command::parse("Scene graveyard"), Ok(Command::Scene(SceneId::Graveyard)));
        assert_eq!(Command::parse("scene 18"), Ok(Command::Scene(SceneId::ExitHole)));
        assert_eq!(Command::parse("mode sequence"), Ok(Command::Mode(ShowMode::Sequence)));
        assert_eq!(Command::parse("bmap 2 none"), Ok(Command::BeamPin { beam: 2, pin: None }));
        assert_eq!(Command::parse("rec 3000"), Ok(Command::Recorder(Capture::For(3000))));
        assert_eq!(Command::parse("mode attract"), Ok(Command::Mode(ShowMode::Attract)));
        assert_eq!(Command::parse("tel 250"), Ok(Command::Telemetry(Some(250))));
        assert_eq!(Command::parse("TEL off"), Ok(Command::Telemetry(None)));
        assert_eq!(Command::from_key(b'4'), Some(Command::Mode(ShowMode::Attract)));
        assert_eq!(Command::from_key(b'5'), None);
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(Command::parse("FLY"), Err(CommandError::Unknown));
        assert_eq!(Command::parse("HOLD"), Err(CommandError::MissingArgument));
        assert_eq!(Command::parse("HOLD x"), Err(CommandError::BadNumber));
        assert_eq!(Command::parse("HOLD -5"), Err(CommandError::BadNumber));
        assert_eq!(Command::parse("BRIGHT 16"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("SDEB 2001"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("SREARM 600001"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("SCENE 16"), Err(CommandError::UnknownScene));
        assert_eq!(Command::parse("BMAP 6 3"), Err(CommandError::BadBeam));
        assert_eq!(Command::parse("BMAP 0 255"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("VER now"), Err(CommandError::TrailingArgument));
        assert_eq!(Command::parse("REC 0"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("TEL 5"), Err(CommandError::OutOfRange));
        assert_eq!(Command::parse("TEL fast"), Err(CommandError::BadValue));
    }
}
