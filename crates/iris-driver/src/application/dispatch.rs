//! Key packet dispatch.
//!
//! Decoded internal packets that are not consumed by the forwarding logic are
//! classified here and handed to one of the handler sets: local input
//! (embedded or not) or translation towards a Eurobraille peer.

use iris_core::protocol::packets::CYCLE_KEY;
use iris_core::{InternalPacket, ProtocolError};
use tracing::warn;

use super::driver::DriverError;

/// Logical input produced by the onboard keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Cursor routing key over `column` (zero-based).
    RoutingKey(u8),
    /// XT scancode; `code` keeps the release bit.
    XtKey { escape: u8, code: u8, repeat: bool },
    /// Linear (command) keys held, as a bit mask.
    LinearKeys(u16),
    /// Braille keys held, as a bit mask.
    BrailleKeys(u16),
}

/// One set of reactions to classified key packets.
pub trait KeyHandlers {
    fn cycle_key(&mut self) -> Result<(), DriverError>;
    fn routing_key(&mut self, column: u8) -> Result<(), DriverError>;
    fn xt_key(&mut self, escape: u8, code: u8, repeat: bool) -> Result<(), DriverError>;
    fn linear_keys(&mut self, keys: u16) -> Result<(), DriverError>;
    fn braille_keys(&mut self, keys: u16) -> Result<(), DriverError>;
}

/// Classifies `packet` and calls the matching handler.
///
/// Routing keys are valid for values `1..=columns`.
///
/// # Errors
///
/// Returns [`ProtocolError::UnexpectedPacket`] (wrapped) for any packet that
/// is not a known key packet, and propagates handler errors.
pub fn dispatch<H: KeyHandlers>(packet: &[u8], columns: u8, handlers: &mut H) -> Result<(), DriverError> {
    let parsed = InternalPacket::parse(packet).map_err(|e| {
        warn!("{e}");
        e
    })?;

    match parsed {
        InternalPacket::Interactive(CYCLE_KEY) => handlers.cycle_key(),
        InternalPacket::Interactive(value) if (1..=columns).contains(&value) => {
            handlers.routing_key(value - 1)
        }
        InternalPacket::XtKey { escape, code, repeat } => handlers.xt_key(escape, code, repeat),
        InternalPacket::LinearKeys(keys) => handlers.linear_keys(keys),
        InternalPacket::BrailleKeys(keys) => handlers.braille_keys(keys),
        InternalPacket::Menu | InternalPacket::Interactive(_) => {
            let error = ProtocolError::unexpected(packet);
            warn!("{error}");
            Err(error.into())
        }
    }
}
