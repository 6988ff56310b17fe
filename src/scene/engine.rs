//! Scene state machine
//!
//! `Idle -> Hold -> Cooldown -> Idle`, driven by beam events, elapsed
//! phase time and operator overrides. The display is best effort: the
//! magnet and the tone follow the phase timers whether or not the scene
//! got the display.

use embassy_time::{Duration, Instant};
use heapless::Vec;

use super::{Phase, SceneId, SceneProfile, ShowMode};
use crate::beam::{BEAM_COUNT, BeamMonitor};
use crate::director_log;
use crate::display::{DisplayArbiter, DisplayProgram, Text4};
use crate::effect::{
    CooldownFlicker, EffectFrame, HoldStutter, IdlePulse, OutputLatch, StatusLevels, TonePlayer,
};
use crate::hardware::{AlphaDisplay, Buzzer, Magnet, StatusLeds};
use crate::mapping::BeamMap;
use crate::random::Rng;

/// Lease time requested past the end of the hold
const LEASE_MARGIN: Duration = Duration::from_millis(500);

/// Interval between lease renewals during hold
const RENEW_INTERVAL: Duration = Duration::from_millis(1_000);

/// How long `DONE` stays up before the cooldown countdown takes over
pub const DONE_DWELL: Duration = Duration::from_millis(500);

const DONE_TEXT: Text4 = Text4(*b"DONE");
const ARMED_TEXT: Text4 = Text4(*b"ARMD");
const STANDBY_TEXT: Text4 = Text4(*b"STBY");
const ATTRACT_TEXT: Text4 = Text4(*b"ATTR");

const MAX_TRANSITIONS: usize = 8;

/// Phases entered during one tick, in order
pub type Transitions = Vec<Transition, MAX_TRANSITIONS>;

/// Phase durations shared by all scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTimings {
    pub hold: Duration,
    pub cooldown: Duration,
}

/// Operator override, applied at the start of the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Force {
    /// Start a scene from its hold. [`SceneId::Standby`] returns to idle.
    Scene(SceneId),
    /// Jump the current (or last) scene to a phase
    Phase(Phase),
}

/// A phase the engine entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub scene: SceneId,
    pub phase: Phase,
    pub at: Instant,
}

/// Drives the active scene
pub struct SceneEngine {
    mode: ShowMode,
    /// [`SceneId::Standby`] while idle
    scene: SceneId,
    last_scene: Option<SceneId>,
    phase: Phase,
    phase_started: Instant,
    timings: SceneTimings,
    pending: Option<Force>,
    next_renew: Instant,
    program: DisplayProgram,
    tone: TonePlayer,
    pulse: IdlePulse,
    stutter: HoldStutter,
    flicker: CooldownFlicker,
    latch: OutputLatch,
    rng: Rng,
    transitions: Transitions,
}

impl SceneEngine {
    /// Idle engine. A [`ShowMode::Sequence`] boot starts the first scene
    /// on the first tick.
    pub fn new(timings: SceneTimings, mode: ShowMode, seed: u64, now: Instant) -> Self {
        let mut engine = Self {
            mode: ShowMode::Triggered,
            scene: SceneId::Standby,
            last_scene: None,
            phase: Phase::Idle,
            phase_started: now,
            timings,
            pending: None,
            next_renew: now,
            program: DisplayProgram::new(&[]),
            tone: TonePlayer::new(),
            pulse: IdlePulse::default(),
            stutter: HoldStutter::default(),
            flicker: CooldownFlicker::new(),
            latch: OutputLatch::new(),
            rng: Rng::new(seed),
            transitions: Vec::new(),
        };
        engine.set_mode(mode);
        engine
    }

    pub const fn mode(&self) -> ShowMode {
        self.mode
    }

    /// Change how scenes are started
    ///
    /// `Standby` stops the running scene, `Sequence` starts the show if
    /// nothing is running. `Triggered` and `Attract` let a running scene
    /// finish.
    pub fn set_mode(&mut self, mode: ShowMode) {
        self.mode = mode;
        match mode {
            ShowMode::Standby => self.pending = Some(Force::Phase(Phase::Idle)),
            ShowMode::Sequence if self.phase == Phase::Idle => {
                self.pending = Some(Force::Scene(SceneId::SEQUENCE[0]));
            }
            ShowMode::Sequence | ShowMode::Triggered | ShowMode::Attract => {}
        }
    }

    /// Running scene, `None` while idle
    pub fn scene(&self) -> Option<SceneId> {
        (self.phase != Phase::Idle).then_some(self.scene)
    }

    pub const fn last_scene(&self) -> Option<SceneId> {
        self.last_scene
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.phase_started)
    }

    pub const fn timings(&self) -> SceneTimings {
        self.timings
    }

    /// New durations apply to the running phase too
    pub fn set_timings(&mut self, timings: SceneTimings) {
        self.timings = timings;
    }

    /// Queue an override. A later call replaces an unapplied one.
    pub fn force(&mut self, force: Force) {
        self.pending = Some(force);
    }

    /// Outputs applied on the last tick
    pub const fn last_frame(&self) -> Option<EffectFrame> {
        self.latch.last()
    }

    /// Run one step of the state machine and drive the outputs
    ///
    /// Beam events are consumed every tick, even when they start nothing.
    pub fn tick<D, O>(
        &mut self,
        beams: &mut BeamMonitor,
        map: &BeamMap,
        display: &mut DisplayArbiter<D>,
        out: &mut O,
        now: Instant,
    ) -> Transitions
    where
        D: AlphaDisplay,
        O: StatusLeds + Buzzer + Magnet,
    {
        if let Some(force) = self.pending.take() {
            self.apply_force(force, display, now);
        }
        self.handle_beams(beams, map, display, now);
        self.advance(display, now);
        let frame = self.animate(display, now);
        self.latch.apply(frame, out);
        core::mem::take(&mut self.transitions)
    }

    fn apply_force<D: AlphaDisplay>(
        &mut self,
        force: Force,
        display: &mut DisplayArbiter<D>,
        now: Instant,
    ) {
        director_log!("[scene] force {:?}", force);
        match force {
            Force::Scene(SceneId::Standby) | Force::Phase(Phase::Idle) => {
                self.enter_idle(display, now);
            }
            Force::Scene(scene) => self.enter_hold(scene, display, now),
            Force::Phase(Phase::Hold) => {
                let scene = self.current_or_last();
                self.enter_hold(scene, display, now);
            }
            Force::Phase(Phase::Cooldown) => {
                self.scene = self.current_or_last();
                self.enter_cooldown(display, now);
            }
        }
    }

    fn handle_beams<D: AlphaDisplay>(
        &mut self,
        beams: &mut BeamMonitor,
        map: &BeamMap,
        display: &mut DisplayArbiter<D>,
        now: Instant,
    ) {
        for idx in 0..BEAM_COUNT {
            if !beams.consume_event(idx) {
                continue;
            }
            let Some(scene) = map.scene_for(idx) else {
                continue;
            };
            let starts = match (self.mode, self.phase) {
                (ShowMode::Triggered, Phase::Idle) => true,
                (ShowMode::Triggered, Phase::Cooldown) => scene != self.scene,
                _ => false,
            };
            if starts {
                self.enter_hold(scene, display, now);
            } else {
                director_log!(
                    "[scene] beam {} ignored in {} {}",
                    idx,
                    self.mode.as_str(),
                    self.phase.as_str()
                );
            }
        }
    }

    fn advance<D: AlphaDisplay>(&mut self, display: &mut DisplayArbiter<D>, now: Instant) {
        let elapsed = self.phase_elapsed(now);
        match self.phase {
            Phase::Idle => {}
            Phase::Hold => {
                if elapsed >= self.timings.hold {
                    self.enter_cooldown(display, now);
                } else {
                    self.keep_display(display, now);
                }
            }
            Phase::Cooldown => {
                if elapsed >= self.timings.cooldown {
                    let ended = self.scene;
                    self.enter_idle(display, now);
                    if self.mode == ShowMode::Sequence {
                        self.enter_hold(ended.next_in_sequence(), display, now);
                    }
                } else if elapsed >= DONE_DWELL {
                    self.release_display(display, now);
                }
            }
        }
    }

    fn enter_hold<D: AlphaDisplay>(
        &mut self,
        scene: SceneId,
        display: &mut DisplayArbiter<D>,
        now: Instant,
    ) {
        let Some(profile) = scene.profile() else {
            self.enter_idle(display, now);
            return;
        };
        if self.phase != Phase::Idle {
            self.release_display(display, now);
        }
        self.scene = scene;
        self.last_scene = Some(scene);
        self.set_phase(Phase::Hold, now);
        self.program = DisplayProgram::new(profile.program);
        self.tone.reset();
        self.next_renew = now + RENEW_INTERVAL;
        self.claim_display(profile, display, now);
        director_log!("[scene] {} hold", scene.as_str());
    }

    /// Shows `DONE` for [`DONE_DWELL`] if the scene still holds the
    /// display; `advance` releases it afterwards.
    fn enter_cooldown<D: AlphaDisplay>(&mut self, display: &mut DisplayArbiter<D>, now: Instant) {
        if let Some(profile) = self.scene.profile() {
            if display.renew(profile.tag, DONE_DWELL, now) {
                display.write_owned(profile.tag, &DONE_TEXT, now);
            }
        }
        self.flicker.reset();
        self.tone.reset();
        self.set_phase(Phase::Cooldown, now);
        director_log!("[scene] {} cooldown", self.scene.as_str());
    }

    fn enter_idle<D: AlphaDisplay>(&mut self, display: &mut DisplayArbiter<D>, now: Instant) {
        if self.phase == Phase::Idle {
            return;
        }
        self.release_display(display, now);
        self.tone.reset();
        self.set_phase(Phase::Idle, now);
        director_log!("[scene] {} done", self.scene.as_str());
        self.scene = SceneId::Standby;
    }

    /// Give up the display of the current scene, if it still holds it
    fn release_display<D: AlphaDisplay>(&self, display: &mut DisplayArbiter<D>, now: Instant) {
        if let Some(profile) = self.scene.profile() {
            display.release(profile.tag, now);
        }
    }

    fn set_phase(&mut self, phase: Phase, now: Instant) {
        self.phase = phase;
        self.phase_started = now;
        let transition = Transition {
            scene: self.scene,
            phase,
            at: now,
        };
        if self.transitions.push(transition).is_err() {
            director_log!("[scene] transition list full");
        }
    }

    fn current_or_last(&self) -> SceneId {
        match self.scene() {
            Some(scene) => scene,
            None => self.last_scene.unwrap_or(SceneId::FrankenLab),
        }
    }

    /// Hold time left plus a margin, so the lease outlives the phase
    fn lease_time(&self, now: Instant) -> Duration {
        let left = self
            .timings
            .hold
            .checked_sub(self.phase_elapsed(now))
            .unwrap_or(Duration::from_ticks(0));
        left + LEASE_MARGIN
    }

    fn claim_display<D: AlphaDisplay>(
        &mut self,
        profile: &'static SceneProfile,
        display: &mut DisplayArbiter<D>,
        now: Instant,
    ) -> bool {
        let lease = self.lease_time(now);
        if !display.acquire(profile.tag, profile.priority, lease, now) {
            return false;
        }
        display.set_brightness_owned(profile.tag, profile.brightness, now);
        if let Some(text) = self.program.current() {
            display.write_owned(profile.tag, &text, now);
        }
        true
    }

    /// Renew the lease and play the next program frame
    fn keep_display<D: AlphaDisplay>(&mut self, display: &mut DisplayArbiter<D>, now: Instant) {
        let Some(profile) = self.scene.profile() else {
            return;
        };
        if now >= self.next_renew {
            self.next_renew = now + RENEW_INTERVAL;
            let lease = self.lease_time(now);
            if !display.renew(profile.tag, lease, now) {
                self.claim_display(profile, display, now);
            }
        }
        if let Some(text) = self.program.tick(now, &mut self.rng) {
            display.write_owned(profile.tag, &text, now);
        }
    }

    fn animate<D: AlphaDisplay>(
        &mut self,
        display: &mut DisplayArbiter<D>,
        now: Instant,
    ) -> EffectFrame {
        let elapsed = self.phase_elapsed(now);
        match self.phase {
            Phase::Idle => {
                let (text, level) = match self.mode {
                    ShowMode::Standby => (STANDBY_TEXT, 0),
                    ShowMode::Attract => (ATTRACT_TEXT, self.pulse.level(elapsed)),
                    ShowMode::Triggered | ShowMode::Sequence => {
                        (ARMED_TEXT, self.pulse.level(elapsed))
                    }
                };
                display.write_idle(&text, now);
                EffectFrame {
                    leds: StatusLevels::armed(level),
                    ..EffectFrame::QUIET
                }
            }
            Phase::Hold => {
                let Some(profile) = self.scene.profile() else {
                    return EffectFrame::QUIET;
                };
                let hold = self.timings.hold;
                EffectFrame {
                    leds: StatusLevels::hold(profile.look.level(&self.stutter, elapsed, hold)),
                    tone: self.tone.sample(profile.tone, elapsed, hold, &mut self.rng),
                    magnet: profile.magnet,
                }
            }
            Phase::Cooldown => {
                let left = self
                    .timings
                    .cooldown
                    .checked_sub(elapsed)
                    .unwrap_or(Duration::from_ticks(0));
                display.write_idle(&countdown_text(left), now);
                EffectFrame {
                    leds: StatusLevels::cooldown(self.flicker.level(now, &mut self.rng)),
                    ..EffectFrame::QUIET
                }
            }
        }
    }
}

/// `C` followed by the seconds left, right-aligned
#[allow(clippy::cast_possible_truncation)]
fn countdown_text(left: Duration) -> Text4 {
    let mut value = left.as_millis().div_ceil(1_000).min(999);
    let mut cells = *b"C   ";
    let mut pos = 3;
    loop {
        cells[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 || pos == 1 {
            break;
        }
        pos -= 1;
    }
    Text4(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_text() {
        assert_eq!(countdown_text(Duration::from_millis(20_000)).as_bytes(), b"C 20");
        assert_eq!(countdown_text(Duration::from_millis(1)).as_bytes(), b"C  1");
        assert_eq!(countdown_text(Duration::from_millis(0)).as_bytes(), b"C  0");
        assert_eq!(countdown_text(Duration::from_millis(5_000_000)).as_bytes(), b"C999");
    }
}
