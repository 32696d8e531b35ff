//! The two key handler sets a driver switches between.
//!
//! - [`LocalKeys`] while in local mode: keys become [`KeyEvent`]s for the
//!   input sink, and the cycle key steps the external protocol.
//! - [`EurobrailleKeys`] while forwarding to a Eurobraille peer: keys are
//!   re-encoded as `K*` packets on the external port.

use tracing::{debug, trace};

use super::{DriverError, IrisDriver};
use crate::application::dispatch::{KeyEvent, KeyHandlers};

pub(super) struct LocalKeys<'a>(pub(super) &'a mut IrisDriver);

impl LocalKeys<'_> {
    fn emit(&self, event: KeyEvent) -> Result<(), DriverError> {
        trace!("local key: {event:?}");
        self.0.hardware.sink.key_event(event);
        Ok(())
    }
}

impl KeyHandlers for LocalKeys<'_> {
    fn cycle_key(&mut self) -> Result<(), DriverError> {
        if self.0.settings.embedded {
            self.0.cycle_protocol()
        } else {
            debug!("cycle key ignored in non-embedded mode");
            Ok(())
        }
    }

    fn routing_key(&mut self, column: u8) -> Result<(), DriverError> {
        self.emit(KeyEvent::RoutingKey(column))
    }

    fn xt_key(&mut self, escape: u8, code: u8, repeat: bool) -> Result<(), DriverError> {
        self.emit(KeyEvent::XtKey { escape, code, repeat })
    }

    fn linear_keys(&mut self, keys: u16) -> Result<(), DriverError> {
        self.emit(KeyEvent::LinearKeys(keys))
    }

    fn braille_keys(&mut self, keys: u16) -> Result<(), DriverError> {
        self.emit(KeyEvent::BrailleKeys(keys))
    }
}

pub(super) struct EurobrailleKeys<'a>(pub(super) &'a mut IrisDriver);

impl KeyHandlers for EurobrailleKeys<'_> {
    fn cycle_key(&mut self) -> Result<(), DriverError> {
        debug!("cycle key ignored while forwarding");
        Ok(())
    }

    fn routing_key(&mut self, column: u8) -> Result<(), DriverError> {
        self.0.write_external(&[b'K', b'I', 0x01, column + 1])
    }

    fn xt_key(&mut self, escape: u8, code: u8, _repeat: bool) -> Result<(), DriverError> {
        for packet in self.0.keyboard.translate(escape, code) {
            self.0.write_external(&packet.to_bytes())?;
        }
        Ok(())
    }

    fn linear_keys(&mut self, keys: u16) -> Result<(), DriverError> {
        let [high, low] = keys.to_be_bytes();
        self.0.write_external(&[b'K', b'C', 0x00, 0x00, high, low])
    }

    fn braille_keys(&mut self, keys: u16) -> Result<(), DriverError> {
        let [high, low] = keys.to_be_bytes();
        self.0.write_external(&[b'K', b'B', high, low])
    }
}
