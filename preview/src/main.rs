//! Desktop preview for hearse-director
//!
//! Runs the director against in-memory hardware in a window: beams and
//! the reed switch are toggles, the keypad and console feed commands,
//! and every output is drawn.

use std::collections::VecDeque;
use std::time::Instant as StdInstant;

use eframe::egui::{self};
use hearse_director::devices::Relay;
use hearse_director::display::MAX_BRIGHTNESS;
use hearse_director::mock::{MockBoard, MockDisplay};
use hearse_director::trigger::TriggerChannel;
use hearse_director::{
    BeamConfig, Command, CommandChannel, CommandSender, Director, DirectorConfig, Instant,
};

/// Keypad queue size
const KEYPAD_SIZE: usize = 8;

/// Reed switch input pin
const REED_PIN: u8 = 10;

/// Console lines kept on screen
const LOG_LINES: usize = 200;

/// Most director ticks run per frame when catching up
const MAX_TICKS_PER_FRAME: usize = 500;

/// Size of each status LED in pixels
const LED_SIZE: f32 = 28.0;

/// Static keypad queue between the UI and the director
static KEYPAD: CommandChannel<KEYPAD_SIZE> = CommandChannel::<KEYPAD_SIZE>::new();

const PREVIEW_CONFIG: DirectorConfig = DirectorConfig {
    seed: 0x5EED,
    reed: Some(BeamConfig::on_pin(REED_PIN)),
    poll_interval: hearse_director::scheduler::DEFAULT_POLL_INTERVAL,
    mode: hearse_director::ShowMode::Triggered,
    recorder: true,
    camera: true,
    capture_tail: hearse_director::Duration::from_millis(3_000),
    telemetry: None,
};

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_title("Hearse Director Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "hearse-director-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()))),
    )
}

struct PreviewApp {
    director: Director<'static, MockBoard, MockDisplay, KEYPAD_SIZE>,
    keypad: CommandSender<'static, KEYPAD_SIZE>,

    /// Synthetic time in milliseconds
    t_ms: u64,
    /// Time of the last director tick
    ticked_ms: u64,
    /// Wall-clock reference for delta time
    last_frame: StdInstant,
    /// Time scale multiplier (1.0 = realtime)
    time_scale: f32,
    /// Broken state per beam slot, as toggled in the UI
    broken: [bool; hearse_director::beam::BEAM_COUNT],
    reed_open: bool,
    /// Console line being typed
    input: String,
    /// Console scrollback
    log: VecDeque<String>,
}

impl PreviewApp {
    fn new() -> Self {
        let director = Director::new(
            MockBoard::new(),
            MockDisplay::new(),
            PREVIEW_CONFIG,
            Instant::from_millis(0),
        )
        .with_commands(KEYPAD.receiver());

        Self {
            director,
            keypad: KEYPAD.sender(),
            t_ms: 0,
            ticked_ms: 0,
            last_frame: StdInstant::now(),
            time_scale: 1.0,
            broken: [false; hearse_director::beam::BEAM_COUNT],
            reed_open: false,
            input: String::new(),
            log: VecDeque::new(),
        }
    }

    /// Update synthetic time based on wall clock and time scale
    fn update_time(&mut self) {
        let now = StdInstant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        let delta_ms_f64 = delta.as_secs_f64() * 1000.0 * f64::from(self.time_scale);
        let delta_ms_f64 = if delta_ms_f64.is_finite() {
            delta_ms_f64.clamp(0.0, 60_000.0)
        } else {
            0.0
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delta_ms = delta_ms_f64 as u64;
        self.t_ms = self.t_ms.wrapping_add(delta_ms);
    }

    /// Push the UI toggles into the simulated inputs
    fn apply_inputs(&mut self) {
        let pins: Vec<Option<u8>> = self
            .director
            .settings()
            .map
            .entries()
            .iter()
            .map(|entry| entry.pin)
            .collect();
        let board = self.director.board_mut();
        for (pin, broken) in pins.into_iter().zip(self.broken) {
            if let Some(pin) = pin {
                board.set_level(pin, !broken);
            }
        }
        board.set_level(REED_PIN, !self.reed_open);
    }

    /// Run the director up to the synthetic time
    fn run_director(&mut self) {
        let step = PREVIEW_CONFIG.poll_interval.as_millis().max(1);
        let mut ticks = 0;
        while self.ticked_ms + step <= self.t_ms && ticks < MAX_TICKS_PER_FRAME {
            self.ticked_ms += step;
            self.director.tick(Instant::from_millis(self.ticked_ms));
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.ticked_ms = self.t_ms;
        }
    }

    fn drain_console(&mut self) {
        let board = self.director.board_mut();
        while let Some(line) = board.output.pop_front() {
            if self.log.len() == LOG_LINES {
                self.log.pop_front();
            }
            self.log.push_back(line.as_str().to_owned());
        }
    }

    fn send_line(&mut self) {
        let line = self.input.trim();
        if !line.is_empty() {
            self.log.push_back(format!("> {line}"));
            self.director.board_mut().type_line(line);
        }
        self.input.clear();
    }

    fn press_key(&self, key: u8) {
        if let Some(command) = Command::from_key(key) {
            let _ = self.keypad.try_send(command);
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "off" }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_time();
        self.apply_inputs();
        self.run_director();
        self.drain_console();

        // Request continuous repaint for animation
        ctx.request_repaint();

        let now = Instant::from_millis(self.ticked_ms);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // <Playback>
                ui.vertical(|ui| {
                    let secs = self.ticked_ms / 1000;
                    let ms = self.ticked_ms % 1000;
                    ui.label(format!("Time: {secs}.{ms:03}s"));
                    ui.horizontal(|ui| {
                        ui.label("Speed:");
                        ui.add(
                            egui::Slider::new(&mut self.time_scale, 0.1..=10.0).logarithmic(true),
                        );
                    });
                });
                // </Playback>
                ui.add_space(16.0);
                // <Keypad>
                ui.vertical(|ui| {
                    ui.label("Keypad:");
                    ui.horizontal(|ui| {
                        if ui.button("1 Sequence").clicked() {
                            self.press_key(b'1');
                        }
                        if ui.button("2 Standby").clicked() {
                            self.press_key(b'2');
                        }
                        if ui.button("3 Triggered").clicked() {
                            self.press_key(b'3');
                        }
                        if ui.button("4 Attract").clicked() {
                            self.press_key(b'4');
                        }
                    });
                });
                // </Keypad>
            });

            ui.add_space(12.0);

            // <Inputs>
            ui.horizontal(|ui| {
                ui.label("Beams:");
                for (idx, broken) in self.broken.iter_mut().enumerate() {
                    let scene = self.director.settings().map.scene_for(idx);
                    let name = scene.map_or("-", |scene| scene.as_str());
                    ui.toggle_value(broken, format!("B{idx} {name}"));
                }
                ui.add_space(8.0);
                ui.toggle_value(&mut self.reed_open, "Reed");
            });
            // </Inputs>

            ui.add_space(12.0);

            // <Display>
            let display = self.director.display().device();
            #[allow(clippy::cast_possible_truncation)]
            let level = (u16::from(display.brightness) * 255 / u16::from(MAX_BRIGHTNESS)) as u8;
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(display.text())
                        .monospace()
                        .size(56.0)
                        .background_color(egui::Color32::BLACK)
                        .color(egui::Color32::from_rgb(level, level / 5, 0)),
                );
                ui.add_space(16.0);
                ui.vertical(|ui| {
                    let owner = self.director.display().owner(now).unwrap_or("-");
                    ui.label(format!("Owner: {owner}"));
                    let engine = self.director.engine();
                    let scene = engine.scene().map_or("-", |scene| scene.as_str());
                    ui.label(format!(
                        "{} {} {}",
                        engine.mode().as_str(),
                        scene,
                        engine.phase().as_str()
                    ));
                });
            });
            // </Display>

            ui.add_space(12.0);

            // <Outputs>
            let board = self.director.board();
            ui.horizontal(|ui| {
                let (response, painter) = ui.allocate_painter(
                    egui::vec2(3.0 * (LED_SIZE + 8.0), LED_SIZE),
                    egui::Sense::hover(),
                );
                let origin = response.rect.min;
                #[allow(clippy::cast_precision_loss)]
                for (i, led) in board.leds.iter().enumerate() {
                    let center = egui::pos2(
                        origin.x + i as f32 * (LED_SIZE + 8.0) + LED_SIZE / 2.0,
                        origin.y + LED_SIZE / 2.0,
                    );
                    let color = egui::Color32::from_rgb(led.r, led.g, led.b);
                    painter.circle_filled(center, LED_SIZE / 2.0, color);
                }
                ui.add_space(8.0);
                ui.vertical(|ui| {
                    let tone = board
                        .tone
                        .map_or_else(|| "silent".to_owned(), |hz| format!("{hz} Hz"));
                    ui.label(format!("Magnet: {}   Tone: {tone}", on_off(board.magnet)));
                    ui.label(format!(
                        "Recorder: {}   Camera: {}   Work light: {}",
                        on_off(board.relay(Relay::Recorder)),
                        on_off(board.relay(Relay::Camera)),
                        on_off(board.relay(Relay::WorkLight)),
                    ));
                    ui.horizontal(|ui| {
                        ui.label("Triggers:");
                        for channel in TriggerChannel::ALL {
                            let high = board.trigger_lines[channel.index()];
                            let pulses = board.trigger_pulses[channel.index()];
                            let color = if high {
                                egui::Color32::YELLOW
                            } else {
                                egui::Color32::GRAY
                            };
                            let text = format!("{} ({pulses})", channel.as_str());
                            ui.label(egui::RichText::new(text).color(color));
                        }
                    });
                });
            });
            // </Outputs>

            ui.add_space(12.0);

            // <Console>
            ui.horizontal(|ui| {
                ui.label("Console:");
                let response =
                    ui.add(egui::TextEdit::singleline(&mut self.input).desired_width(300.0));
                let entered =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if entered || ui.button("Send").clicked() {
                    self.send_line();
                    response.request_focus();
                }
            });
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for line in &self.log {
                        ui.monospace(line);
                    }
                });
            // </Console>
        });
    }
}
