//! Event logging
//!
//! With the `esp32-log` feature, [`director_log!`](crate::director_log)
//! prints through `esp-println` while the runtime flag is on. The
//! operator flips the flag with `LOG ON|OFF`. Without the feature the
//! macro only type-checks its arguments.

use core::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn event logging on or off at runtime
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether event logging is currently on
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Log a formatted event line
#[macro_export]
macro_rules! director_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "esp32-log")]
        {
            if $crate::log::is_enabled() {
                ::esp_println::println!($($arg)*);
            }
        }

        #[cfg(not(feature = "esp32-log"))]
        {
            if false {
                let _ = ::core::format_args!($($arg)*);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_flag() {
        set_enabled(false);
        assert!(!is_enabled());
        crate::director_log!("dropped {}", 1);
        set_enabled(true);
        assert!(is_enabled());
    }
}
