//! Shared display arbitration
//!
//! One physical 4-character display is multiplexed between concurrent
//! animation sources through a priority lease:
//!
//! - a free display can be taken by anyone,
//! - the current owner may re-acquire (acts as a renew),
//! - anyone else needs a strictly higher priority to preempt,
//! - a lease with a hold time lapses on its own once it runs out.
//!
//! Writes and brightness changes are silently dropped unless they come
//! from the current owner. A losing acquire never changes any state.

mod program;
mod text;

use embassy_time::{Duration, Instant};
use heapless::String;

pub use program::{DisplayProgram, ProgramStep};
pub use text::{BLANK, Text4};

use crate::director_log;
use crate::hardware::AlphaDisplay;

/// Maximum length of an owner tag
pub const OWNER_TAG_LEN: usize = 8;

/// Highest accepted brightness level
pub const MAX_BRIGHTNESS: u8 = 15;

/// Owner tag storage
pub type OwnerTag = String<OWNER_TAG_LEN>;

#[derive(Debug, Clone)]
struct Lease {
    owner: OwnerTag,
    priority: u8,
    /// `None` holds until released
    hold_until: Option<Instant>,
}

impl Lease {
    fn is_expired(&self, now: Instant) -> bool {
        self.hold_until.is_some_and(|until| now > until)
    }
}

/// Priority lease around the single alphanumeric display
pub struct DisplayArbiter<D: AlphaDisplay> {
    device: D,
    lease: Option<Lease>,
    /// Last buffer sent to the device
    shown: Option<Text4>,
    /// Last brightness sent to the device
    brightness: Option<u8>,
    /// Brightness restored whenever the display is free
    idle_brightness: u8,
}

impl<D: AlphaDisplay> DisplayArbiter<D> {
    /// Wrap the device. The display starts free.
    pub fn new(device: D, idle_brightness: u8) -> Self {
        let mut arbiter = Self {
            device,
            lease: None,
            shown: None,
            brightness: None,
            idle_brightness: idle_brightness.min(MAX_BRIGHTNESS),
        };
        arbiter.push_brightness(arbiter.idle_brightness);
        arbiter
    }

    /// Try to take (or renew) the display
    ///
    /// Succeeds if the display is free, `owner` already holds it, or
    /// `priority` is strictly higher than the current owner's. A zero
    /// `hold` never expires on its own.
    pub fn acquire(&mut self, owner: &str, priority: u8, hold: Duration, now: Instant) -> bool {
        self.expire(now);
        if owner.is_empty() {
            return false;
        }
        let granted = match &self.lease {
            None => true,
            Some(lease) => lease.owner == owner || priority > lease.priority,
        };
        if !granted {
            director_log!("[display] {} denied (prio {})", owner, priority);
            return false;
        }
        let Ok(tag) = OwnerTag::try_from(owner) else {
            return false;
        };
        if let Some(previous) = &self.lease {
            if previous.owner != owner {
                director_log!("[display] {} preempts {}", owner, previous.owner.as_str());
            }
        }
        self.lease = Some(Lease {
            owner: tag,
            priority,
            hold_until: hold_deadline(hold, now),
        });
        true
    }

    /// Extend or replace the hold of the current owner
    pub fn renew(&mut self, owner: &str, hold: Duration, now: Instant) -> bool {
        self.expire(now);
        match &mut self.lease {
            Some(lease) if lease.owner == owner => {
                lease.hold_until = hold_deadline(hold, now);
                true
            }
            _ => false,
        }
    }

    /// Give the display back. No-op unless `owner` holds it.
    pub fn release(&mut self, owner: &str, now: Instant) {
        self.expire(now);
        if self.lease.as_ref().is_some_and(|lease| lease.owner == owner) {
            self.clear_lease();
        }
    }

    pub fn is_owner(&self, owner: &str, now: Instant) -> bool {
        self.active_lease(now).is_some_and(|lease| lease.owner == owner)
    }

    pub fn is_free(&self, now: Instant) -> bool {
        self.active_lease(now).is_none()
    }

    /// Current owner tag, if any
    pub fn owner(&self, now: Instant) -> Option<&str> {
        self.active_lease(now).map(|lease| lease.owner.as_str())
    }

    /// Write four characters on behalf of `owner`
    ///
    /// Dropped unless `owner` holds the display. Returns whether the
    /// caller was allowed to write.
    pub fn write_owned(&mut self, owner: &str, text: &Text4, now: Instant) -> bool {
        self.expire(now);
        if !self.lease.as_ref().is_some_and(|lease| lease.owner == owner) {
            return false;
        }
        self.push_text(text);
        true
    }

    /// Set the brightness on behalf of `owner`, clamped to 0-15
    pub fn set_brightness_owned(&mut self, owner: &str, level: u8, now: Instant) -> bool {
        self.expire(now);
        if !self.lease.as_ref().is_some_and(|lease| lease.owner == owner) {
            return false;
        }
        self.push_brightness(level.min(MAX_BRIGHTNESS));
        true
    }

    /// Write only if nobody holds the display
    pub fn write_idle(&mut self, text: &Text4, now: Instant) -> bool {
        self.expire(now);
        if self.lease.is_some() {
            return false;
        }
        self.push_text(text);
        true
    }

    /// Brightness used while the display is free
    pub const fn idle_brightness(&self) -> u8 {
        self.idle_brightness
    }

    /// Change the free-display brightness, clamped to 0-15
    ///
    /// Applied immediately if the display is free, otherwise when the
    /// current lease ends.
    pub fn set_idle_brightness(&mut self, level: u8, now: Instant) {
        self.expire(now);
        self.idle_brightness = level.min(MAX_BRIGHTNESS);
        if self.lease.is_none() {
            self.push_brightness(self.idle_brightness);
        }
    }

    /// Last text sent to the device
    pub const fn shown(&self) -> Option<Text4> {
        self.shown
    }

    pub const fn device(&self) -> &D {
        &self.device
    }

    pub const fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn active_lease(&self, now: Instant) -> Option<&Lease> {
        self.lease.as_ref().filter(|lease| !lease.is_expired(now))
    }

    /// Drop a lapsed lease
    fn expire(&mut self, now: Instant) {
        if self.lease.as_ref().is_some_and(|lease| lease.is_expired(now)) {
            director_log!("[display] lease expired");
            self.clear_lease();
        }
    }

    fn clear_lease(&mut self) {
        self.lease = None;
        self.push_brightness(self.idle_brightness);
    }

    fn push_text(&mut self, text: &Text4) {
        if self.shown.as_ref() == Some(text) {
            return;
        }
        self.device.write(text.as_bytes());
        self.shown = Some(*text);
    }

    fn push_brightness(&mut self, level: u8) {
        if self.brightness == Some(level) {
            return;
        }
        self.device.set_brightness(level);
        self.brightness = Some(level);
    }
}

fn hold_deadline(hold: Duration, now: Instant) -> Option<Instant> {
    if hold.as_ticks() == 0 {
        None
    } else {
        Some(now + hold)
    }
}
