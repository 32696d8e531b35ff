//! Control bytes and the catalogue of packets exchanged with the onboard controller.
//!
//! Packets arriving on the internal line are one type byte followed by a
//! short argument:
//!
//! ```text
//! ['I', value]          interactive key: 'Q' menu, 'W' cycle, 1..=columns routing
//! ['X', escape, code]   XT scancode (escape is 0x00, 0xE0 or 0xE1)
//! ['Y', escape, code]   XT scancode, auto-repeat
//! ['L', high, low]      linear (command) keys, 16-bit mask
//! ['B', high, low]      braille keys, 16-bit mask
//! ```

use thiserror::Error;

use super::hex_dump;

// ── Control bytes ─────────────────────────────────────────────────────────────

pub const SOH: u8 = 0x01;
pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;
pub const EOT: u8 = 0x04;
pub const ACK: u8 = 0x06;
pub const DLE: u8 = 0x10;
pub const NAK: u8 = 0x15;

// ── Packet type bytes ─────────────────────────────────────────────────────────

/// Type bytes of packets received from the onboard controller.
pub mod input_type {
    pub const INTERACTIVE_KEY: u8 = b'I';
    pub const XT_KEY_CODE: u8 = b'X';
    pub const XT_KEY_CODE_REPEAT: u8 = b'Y';
    pub const LINEAR_KEYS: u8 = b'L';
    pub const BRAILLE_KEYS: u8 = b'B';
}

/// Type bytes of packets sent to the onboard controller.
pub mod output_type {
    pub const WRITE_BRAILLE: u8 = b'B';
}

/// Interactive-key value of the menu key that toggles packet forward mode.
pub const MENU_KEY: u8 = b'Q';

/// Interactive-key value of the "Z" key that cycles the external protocol.
pub const CYCLE_KEY: u8 = b'W';

/// The two-byte menu key packet, also sent to a native peer as an attention signal.
pub const MENU_PACKET: [u8; 2] = [input_type::INTERACTIVE_KEY, MENU_KEY];

/// Errors produced while classifying or encoding packets.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The packet does not match any known type/length combination.
    #[error("unexpected packet: {0}")]
    UnexpectedPacket(String),

    /// The payload cannot be represented in the frame's length field.
    #[error("payload too large: {size} bytes (maximum {maximum})")]
    PayloadTooLarge { size: usize, maximum: usize },

    /// The frame format cannot carry an empty payload.
    #[error("empty payload cannot be framed")]
    EmptyPayload,
}

impl ProtocolError {
    pub fn unexpected(packet: &[u8]) -> Self {
        ProtocolError::UnexpectedPacket(hex_dump(packet))
    }
}

/// A classified packet from the internal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalPacket {
    /// The menu key (`'I' 'Q'`).
    Menu,
    /// Any other interactive key value: the cycle key or a routing key.
    Interactive(u8),
    /// An XT scancode; `code` keeps the release bit.
    XtKey { escape: u8, code: u8, repeat: bool },
    /// Linear (command) keys as a 16-bit mask.
    LinearKeys(u16),
    /// Braille keys as a 16-bit mask.
    BrailleKeys(u16),
}

impl InternalPacket {
    /// Classifies a decoded internal packet by its length and type byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedPacket`] for any other shape.
    pub fn parse(packet: &[u8]) -> Result<Self, ProtocolError> {
        match *packet {
            [input_type::INTERACTIVE_KEY, MENU_KEY] => Ok(InternalPacket::Menu),
            [input_type::INTERACTIVE_KEY, value] => Ok(InternalPacket::Interactive(value)),
            [input_type::XT_KEY_CODE, escape, code] => Ok(InternalPacket::XtKey {
                escape,
                code,
                repeat: false,
            }),
            [input_type::XT_KEY_CODE_REPEAT, escape, code] => Ok(InternalPacket::XtKey {
                escape,
                code,
                repeat: true,
            }),
            [input_type::LINEAR_KEYS, high, low] => {
                Ok(InternalPacket::LinearKeys(u16::from_be_bytes([high, low])))
            }
            [input_type::BRAILLE_KEYS, high, low] => {
                Ok(InternalPacket::BrailleKeys(u16::from_be_bytes([high, low])))
            }
            _ => Err(ProtocolError::unexpected(packet)),
        }
    }
}

/// Returns `true` if `packet` is the two-byte menu key packet.
pub fn is_menu_packet(packet: &[u8]) -> bool {
    packet == MENU_PACKET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_packet_is_classified_as_menu() {
        assert_eq!(InternalPacket::parse(b"IQ"), Ok(InternalPacket::Menu));
        assert!(is_menu_packet(b"IQ"));
    }

    #[test]
    fn test_interactive_value_is_kept_verbatim() {
        assert_eq!(
            InternalPacket::parse(&[b'I', 0x01]),
            Ok(InternalPacket::Interactive(0x01))
        );
        assert_eq!(
            InternalPacket::parse(&[b'I', CYCLE_KEY]),
            Ok(InternalPacket::Interactive(CYCLE_KEY))
        );
    }

    #[test]
    fn test_xt_packets_carry_escape_code_and_repeat_flag() {
        assert_eq!(
            InternalPacket::parse(&[b'X', 0xE0, 0x48]),
            Ok(InternalPacket::XtKey {
                escape: 0xE0,
                code: 0x48,
                repeat: false
            })
        );
        assert_eq!(
            InternalPacket::parse(&[b'Y', 0x00, 0x10]),
            Ok(InternalPacket::XtKey {
                escape: 0x00,
                code: 0x10,
                repeat: true
            })
        );
    }

    #[test]
    fn test_key_masks_are_big_endian() {
        assert_eq!(
            InternalPacket::parse(&[b'L', 0x12, 0x34]),
            Ok(InternalPacket::LinearKeys(0x1234))
        );
        assert_eq!(
            InternalPacket::parse(&[b'B', 0x80, 0x01]),
            Ok(InternalPacket::BrailleKeys(0x8001))
        );
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let result = InternalPacket::parse(&[b'X', 0x10]);
        assert_eq!(result, Err(ProtocolError::UnexpectedPacket("58 10".to_string())));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(InternalPacket::parse(&[b'Z', 0x00, 0x00]).is_err());
        assert!(InternalPacket::parse(&[]).is_err());
    }
}
