//! Stand-in hardware collaborators for running the bridge on a host.
//!
//! On the device these traits are backed by GPIO lines and the screen
//! reader.  The bridge binary runs without either, so power changes and
//! input events are logged and the latch is a software switch.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::application::dispatch::KeyEvent;
use crate::application::driver::{DevicePower, InputSink, LatchSensor};

/// Records the power state and logs every change.
#[derive(Debug)]
pub struct LoggingPower {
    powered: AtomicBool,
}

impl LoggingPower {
    pub fn new() -> Self {
        Self {
            powered: AtomicBool::new(true),
        }
    }

    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Relaxed)
    }
}

impl Default for LoggingPower {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicePower for LoggingPower {
    fn power_on(&self) {
        info!("braille cells powered on");
        self.powered.store(true, Ordering::Relaxed);
    }

    fn power_off(&self) {
        info!("braille cells powered off");
        self.powered.store(false, Ordering::Relaxed);
    }
}

/// A latch line set in software.
#[derive(Debug, Default)]
pub struct SwitchLatch {
    pulled: AtomicBool,
}

impl SwitchLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pulled(&self, pulled: bool) {
        self.pulled.store(pulled, Ordering::Relaxed);
    }
}

impl LatchSensor for SwitchLatch {
    fn is_pulled(&self) -> bool {
        self.pulled.load(Ordering::Relaxed)
    }
}

/// Logs local key events and messages, and tracks the online flag.
#[derive(Debug)]
pub struct LoggingSink {
    online: AtomicBool,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSink for LoggingSink {
    fn key_event(&self, event: KeyEvent) {
        info!("key: {event:?}");
    }

    fn message(&self, text: &str) {
        info!("message: {text}");
    }

    fn set_online(&self, online: bool) {
        if self.online.swap(online, Ordering::Relaxed) != online {
            info!("display {}", if online { "online" } else { "offline" });
        }
    }
}
