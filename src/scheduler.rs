//! Top-level loop driver
//!
//! Portable pacing without async: the caller sleeps between ticks for
//! the duration returned by [`Director::tick`]. Each tick runs, in
//! order:
//!
//! 1. console input and queued commands,
//! 2. the beam monitor,
//! 3. the scene engine (animators and display included),
//! 4. trigger pulses, recorder windows and the work light,
//! 5. the telemetry frame, when one is due.
//!
//! # Usage
//!
//! ```ignore
//! let mut director = Director::new(board, display, DirectorConfig::default(), now());
//!
//! loop {
//!     let result = director.tick(now());
//!     sleep(result.sleep_duration);
//! }
//! ```

use core::fmt::Write;

use embassy_time::{Duration, Instant};
use heapless::String;

use crate::beam::{BeamConfig, BeamMonitor, REED_SLOT, SLOT_COUNT};
use crate::channel::CommandReceiver;
use crate::console::{Capture, Command, CommandError, HELP_LINES, LineReader};
use crate::devices::{AuxRelay, INTRO_LIGHT_KILL, Relay, WorkLight};
use crate::display::DisplayArbiter;
use crate::effect::EffectFrame;
use crate::hardware::{AlphaDisplay, Board};
use crate::scene::{Force, Phase, SceneEngine, SceneId, ShowMode, Transition};
use crate::settings::Settings;
use crate::telemetry::{Telemetry, TelemetryFrame};
use crate::trigger::TriggerBus;
use crate::{director_log, log};

/// Default loop period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Queued commands handled per tick
const COMMANDS_PER_TICK: usize = 4;

const REPLY_LEN: usize = 96;

type Reply = String<REPLY_LEN>;

/// Boot constants that are not persisted
#[derive(Debug, Clone, Copy)]
pub struct DirectorConfig {
    /// Seed for flicker, tone hops and display digits
    pub seed: u64,
    /// Reed switch wiring, `None` when not fitted
    pub reed: Option<BeamConfig>,
    pub poll_interval: Duration,
    /// Show mode after boot
    pub mode: ShowMode,
    /// Whether the recorder relay is wired
    pub recorder: bool,
    /// Whether the camera relay is wired
    pub camera: bool,
    /// Recording time added after the hold when a scene starts a capture
    pub capture_tail: Duration,
    /// Telemetry interval after boot, `None` keeps it off
    pub telemetry: Option<Duration>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            seed: 0x4845_4152_5345,
            reed: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            mode: ShowMode::Triggered,
            recorder: false,
            camera: false,
            capture_tail: Duration::from_millis(3_000),
            telemetry: None,
        }
    }
}

/// Timing of the next tick
#[derive(Debug, Clone, Copy)]
pub struct TickResult {
    pub next_deadline: Instant,
    /// How long to wait until the next tick (zero if behind schedule)
    pub sleep_duration: Duration,
}

/// Owns every component and runs them in a fixed order
pub struct Director<'a, B: Board, D: AlphaDisplay, const QUEUE: usize = 8> {
    board: B,
    display: DisplayArbiter<D>,
    beams: BeamMonitor,
    engine: SceneEngine,
    triggers: TriggerBus,
    recorder: AuxRelay,
    camera: AuxRelay,
    light: WorkLight,
    settings: Settings,
    console: LineReader,
    telemetry: Telemetry,
    commands: Option<CommandReceiver<'a, QUEUE>>,
    config: DirectorConfig,
    next_tick: Instant,
}

impl<'a, B: Board, D: AlphaDisplay, const QUEUE: usize> Director<'a, B, D, QUEUE> {
    /// Load the settings from the board and bring every component up
    ///
    /// A missing or damaged settings record falls back to the defaults.
    pub fn new(mut board: B, display: D, config: DirectorConfig, now: Instant) -> Self {
        let settings = Settings::load_or_default(&mut board);
        let beams = BeamMonitor::configure(
            &settings.map.beam_configs(config.reed),
            settings.beam_timing(),
            now,
        );
        Self {
            display: DisplayArbiter::new(display, settings.brightness),
            engine: SceneEngine::new(settings.scene_timings(), config.mode, config.seed, now),
            beams,
            triggers: TriggerBus::new(),
            recorder: AuxRelay::new(Relay::Recorder, config.recorder),
            camera: AuxRelay::new(Relay::Camera, config.camera),
            light: WorkLight::new(),
            settings,
            console: LineReader::new(),
            telemetry: Telemetry::new(config.telemetry, now),
            commands: None,
            config,
            next_tick: now,
            board,
        }
    }

    /// Also drain `commands` every tick
    #[must_use]
    pub fn with_commands(mut self, commands: CommandReceiver<'a, QUEUE>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Run one loop iteration and return when the next one is due
    ///
    /// Falling behind by more than two intervals skips the backlog
    /// instead of bursting to catch up.
    pub fn tick(&mut self, now: Instant) -> TickResult {
        let interval = self.config.poll_interval;
        if now > self.next_tick + interval + interval {
            self.next_tick = now;
        }

        self.service_commands(now);
        self.beams.tick(&mut self.board, now);
        if self.beams.consume_event(REED_SLOT) {
            director_log!("[beam] reed opened");
        }
        let transitions = self.engine.tick(
            &mut self.beams,
            &self.settings.map,
            &mut self.display,
            &mut self.board,
            now,
        );
        for transition in &transitions {
            self.on_transition(transition, now);
        }
        self.triggers.service(&mut self.board, now);
        self.recorder.service(&mut self.board, now);
        self.camera.service(&mut self.board, now);
        self.light
            .service(self.beams.is_broken(REED_SLOT), &mut self.board, now);
        if self.telemetry.due(now) {
            self.emit_telemetry(now);
        }

        self.next_tick += interval;
        let sleep_duration = self
            .next_tick
            .checked_duration_since(now)
            .unwrap_or(Duration::from_ticks(0));
        TickResult {
            next_deadline: self.next_tick,
            sleep_duration,
        }
    }

    /// Execute one command and reply on the console
    pub fn execute(&mut self, command: Command, now: Instant) -> Result<(), CommandError> {
        let result = self.apply(command, now);
        match result {
            Ok(()) => {
                let mut line = Reply::new();
                let _ = write!(line, "OK {}", command.name());
                self.board.write_line(&line);
            }
            Err(err) => {
                director_log!("[console] {} rejected: {}", command.name(), err);
                self.reply_err(err);
            }
        }
        result
    }

    pub const fn board(&self) -> &B {
        &self.board
    }

    pub const fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub const fn display(&self) -> &DisplayArbiter<D> {
        &self.display
    }

    pub const fn display_mut(&mut self) -> &mut DisplayArbiter<D> {
        &mut self.display
    }

    pub const fn beams(&self) -> &BeamMonitor {
        &self.beams
    }

    pub const fn engine(&self) -> &SceneEngine {
        &self.engine
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn triggers(&self) -> &TriggerBus {
        &self.triggers
    }

    pub const fn recorder(&self) -> &AuxRelay {
        &self.recorder
    }

    pub const fn camera(&self) -> &AuxRelay {
        &self.camera
    }

    pub const fn light(&self) -> &WorkLight {
        &self.light
    }

    fn service_commands(&mut self, now: Instant) {
        if let Some(line) = self.console.poll(&mut self.board) {
            match Command::parse(&line) {
                Ok(command) => {
                    let _ = self.execute(command, now);
                }
                Err(CommandError::Empty) => {}
                Err(err) => self.reply_err(err),
            }
        }
        let Some(commands) = self.commands else {
            return;
        };
        for _ in 0..COMMANDS_PER_TICK {
            let Some(command) = commands.try_receive() else {
                break;
            };
            let _ = self.execute(command, now);
        }
    }

    fn apply(&mut self, command: Command, now: Instant) -> Result<(), CommandError> {
        match command {
            Command::Help => {
                for line in HELP_LINES {
                    self.board.write_line(line);
                }
            }
            Command::Config => self.print_config(now),
            Command::Map => self.print_map(),
            Command::Version => {
                self.board
                    .write_line(concat!("hearse-director ", env!("CARGO_PKG_VERSION")));
            }
            Command::Hold(ms) => {
                self.settings.hold_ms = ms;
                self.engine.set_timings(self.settings.scene_timings());
            }
            Command::Cooldown(ms) => {
                self.settings.cooldown_ms = ms;
                self.engine.set_timings(self.settings.scene_timings());
            }
            Command::Debounce(ms) => {
                self.settings.debounce_ms = ms;
                self.beams.set_timing(self.settings.beam_timing());
            }
            Command::Rearm(ms) => {
                self.settings.rearm_ms = ms;
                self.beams.set_timing(self.settings.beam_timing());
            }
            Command::Brightness(level) => {
                self.settings.brightness = level;
                self.display.set_idle_brightness(level, now);
            }
            Command::State(phase) => self.engine.force(Force::Phase(phase)),
            Command::Scene(scene) => self.engine.force(Force::Scene(scene)),
            Command::Save => self.settings.save(&mut self.board)?,
            Command::Load => {
                let settings = Settings::load(&mut self.board)?;
                self.apply_settings(settings, now);
            }
            Command::Reset => self.apply_settings(Settings::default(), now),
            Command::BeamPin { beam, pin } => {
                if !self.settings.map.set_pin(beam, pin) {
                    return Err(CommandError::BadBeam);
                }
                self.beams
                    .set_config(beam, BeamConfig { pin, invert: false }, now);
            }
            Command::BeamScene { beam, scene } => {
                if !self.settings.map.set_scene(beam, scene) {
                    return Err(CommandError::BadBeam);
                }
            }
            Command::Log(on) => log::set_enabled(on),
            Command::Recorder(capture) => {
                apply_capture(&mut self.recorder, capture, &mut self.board, now)?;
            }
            Command::Camera(capture) => {
                apply_capture(&mut self.camera, capture, &mut self.board, now)?;
            }
            Command::Trigger(channel) => {
                if !self.triggers.fire(channel, &mut self.board, now) {
                    return Err(CommandError::Busy);
                }
            }
            Command::Light(mode) => self.light.set_mode(mode),
            Command::Mode(mode) => {
                self.engine.set_mode(mode);
                let cue = mode.cue();
                if !self.triggers.fire(cue, &mut self.board, now) {
                    director_log!("[director] {} cue dropped", cue.as_str());
                }
            }
            Command::Telemetry(ms) => {
                let interval = ms.map(|ms| Duration::from_millis(u64::from(ms)));
                self.telemetry.set_interval(interval, now);
            }
        }
        Ok(())
    }

    /// Replace the settings and push them into every component
    fn apply_settings(&mut self, settings: Settings, now: Instant) {
        self.settings = settings;
        self.beams = BeamMonitor::configure(
            &settings.map.beam_configs(self.config.reed),
            settings.beam_timing(),
            now,
        );
        self.engine.set_timings(settings.scene_timings());
        self.display.set_idle_brightness(settings.brightness, now);
    }

    /// Hold-entry side effects outside the engine
    fn on_transition(&mut self, transition: &Transition, now: Instant) {
        if transition.phase != Phase::Hold {
            return;
        }
        let Some(profile) = transition.scene.profile() else {
            return;
        };
        if let Some(channel) = profile.cue {
            self.triggers.fire(channel, &mut self.board, now);
        }
        if let Some(relay) = profile.capture {
            let length = self.engine.timings().hold + self.config.capture_tail;
            let device = match relay {
                Relay::Camera => &mut self.camera,
                Relay::Recorder | Relay::WorkLight => &mut self.recorder,
            };
            device.record_for(length, &mut self.board, now);
        }
        if transition.scene == SceneId::Intro {
            self.light.kill_for(INTRO_LIGHT_KILL, now);
        }
    }

    fn emit_telemetry(&mut self, now: Instant) {
        let beams = (0..SLOT_COUNT)
            .filter(|&idx| self.beams.is_broken(idx))
            .fold(0u8, |mask, idx| mask | (1 << idx));
        let frame = TelemetryFrame::new(
            now,
            self.engine.scene().unwrap_or(SceneId::Standby),
            self.engine.phase(),
            beams,
            self.engine.last_frame().unwrap_or(EffectFrame::QUIET),
        );
        let mut line = Reply::new();
        let _ = write!(line, "{}", frame);
        self.board.write_line(&line);
    }

    fn reply_err(&mut self, err: CommandError) {
        let mut line = Reply::new();
        let _ = write!(line, "ERR {}", err);
        self.board.write_line(&line);
    }

    fn print_config(&mut self, now: Instant) {
        let s = self.settings;
        let mut line = Reply::new();
        let _ = write!(
            line,
            "HOLD {} COOL {} SDEB {} SREARM {} BRIGHT {}",
            s.hold_ms, s.cooldown_ms, s.debounce_ms, s.rearm_ms, s.brightness
        );
        self.board.write_line(&line);

        line.clear();
        let scene = self.engine.scene().unwrap_or(SceneId::Standby);
        let _ = write!(
            line,
            "MODE {} SCENE {} {} {}ms",
            self.engine.mode().as_str(),
            scene.as_str(),
            self.engine.phase().as_str(),
            self.engine.phase_elapsed(now).as_millis()
        );
        self.board.write_line(&line);

        line.clear();
        let _ = write!(
            line,
            "LIGHT {} LOG {} TEL ",
            self.light.mode().as_str(),
            if log::is_enabled() { "ON" } else { "OFF" },
        );
        let _ = match self.telemetry.interval() {
            Some(interval) => write!(line, "{}", interval.as_millis()),
            None => write!(line, "OFF"),
        };
        let _ = write!(line, " DISPLAY {}", self.display.owner(now).unwrap_or("-"));
        self.board.write_line(&line);
    }

    fn print_map(&mut self) {
        for (idx, entry) in self.settings.map.entries().iter().enumerate() {
            let mut line = Reply::new();
            let _ = write!(line, "B{} PIN ", idx);
            let _ = match entry.pin {
                Some(pin) => write!(line, "{}", pin),
                None => write!(line, "NONE"),
            };
            let _ = write!(
                line,
                " SCENE {} ({})",
                entry.scene.as_str(),
                entry.scene.code()
            );
            self.board.write_line(&line);
        }
    }
}

fn apply_capture<B: Board>(
    device: &mut AuxRelay,
    capture: Capture,
    board: &mut B,
    now: Instant,
) -> Result<(), CommandError> {
    if !device.is_present() {
        return Err(CommandError::NoDevice);
    }
    match capture {
        Capture::On => device.power(true, board),
        Capture::Off => device.power(false, board),
        Capture::For(ms) => {
            device.record_for(Duration::from_millis(u64::from(ms)), board, now);
        }
    }
    Ok(())
}
