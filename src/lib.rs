#![cfg_attr(not(test), no_std)]

pub mod beam;
pub mod channel;
pub mod console;
pub mod devices;
pub mod display;
pub mod effect;
pub mod hardware;
pub mod log;
pub mod mapping;
pub mod math8;
pub mod mock;
pub mod random;
pub mod scene;
pub mod scheduler;
pub mod settings;
pub mod telemetry;
pub mod trigger;

pub use beam::{BeamConfig, BeamMonitor, BeamTiming};
pub use channel::{CommandChannel, CommandReceiver, CommandSender};
pub use console::{Command, CommandError};
pub use display::{DisplayArbiter, Text4};
pub use hardware::{AlphaDisplay, Board};
pub use mapping::BeamMap;
pub use scene::{Phase, SceneEngine, SceneId, ShowMode};
pub use scheduler::{Director, DirectorConfig, TickResult};
pub use settings::{Settings, SettingsError};

pub use embassy_time::{Duration, Instant};

/// Status LED color
pub type Rgb = smart_leds::RGB8;
