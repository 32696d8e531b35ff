//! Eurobraille frame codec used towards a Eurobraille peer.
//!
//! Wire format:
//! ```text
//! STX [length:2, big-endian] [payload: length-2] ETX
//! ```
//! The length field counts itself plus the payload, so it is always the
//! payload length + 2 and never less than 3.  Nothing is escaped.

use tracing::{debug, trace, warn};

use super::packets::{ProtocolError, ETX, STX};
use super::{hex_dump, DecodeStep, FrameDecoder, MAXIMUM_PACKET_SIZE};

/// Size of the length field, which the length value includes.
const LENGTH_FIELD_SIZE: usize = 2;

/// Smallest valid value of the length field (one payload byte).
const MINIMUM_DECLARED_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EurobrailleState {
    /// Waiting for `STX`.
    Idle,
    /// Expecting the high byte of the length.
    LengthHigh,
    /// Expecting the low byte of the length.
    LengthLow,
    /// Accumulating payload bytes.
    Payload,
    /// Expecting `ETX`.
    End,
    /// Discarding bytes until `ETX` after a size mismatch.
    Resync,
}

/// Incremental decoder for `STX … ETX` frames.
#[derive(Debug)]
pub struct EurobrailleDecoder {
    state: EurobrailleState,
    length_high: u8,
    expected: usize,
    buffer: Vec<u8>,
}

impl EurobrailleDecoder {
    pub fn new() -> Self {
        Self {
            state: EurobrailleState::Idle,
            length_high: 0,
            expected: 0,
            buffer: Vec::with_capacity(MAXIMUM_PACKET_SIZE),
        }
    }
}

impl Default for EurobrailleDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for EurobrailleDecoder {
    fn push(&mut self, byte: u8) -> DecodeStep {
        match self.state {
            EurobrailleState::Idle => {
                if byte == STX {
                    self.buffer.clear();
                    self.state = EurobrailleState::LengthHigh;
                } else {
                    debug!("ignored byte outside Eurobraille frame: {byte:02X}");
                }
            }

            EurobrailleState::LengthHigh => {
                self.length_high = byte;
                self.state = EurobrailleState::LengthLow;
            }

            EurobrailleState::LengthLow => {
                let declared = usize::from(u16::from_be_bytes([self.length_high, byte]));
                if declared < MINIMUM_DECLARED_LENGTH {
                    warn!("invalid Eurobraille packet declared size: {declared}");
                    self.state = EurobrailleState::Idle;
                } else {
                    let payload = declared - LENGTH_FIELD_SIZE;
                    if payload > MAXIMUM_PACKET_SIZE {
                        warn!(
                            "Eurobraille packet too large: {payload} bytes (maximum {MAXIMUM_PACKET_SIZE})"
                        );
                        self.state = EurobrailleState::Idle;
                    } else {
                        self.expected = payload;
                        self.state = EurobrailleState::Payload;
                    }
                }
            }

            EurobrailleState::Payload => {
                self.buffer.push(byte);
                if self.buffer.len() == self.expected {
                    self.state = EurobrailleState::End;
                }
            }

            EurobrailleState::End => {
                if byte == ETX {
                    self.state = EurobrailleState::Idle;
                    let payload = std::mem::take(&mut self.buffer);
                    trace!("Eurobraille packet received: {}", hex_dump(&payload));
                    return DecodeStep::Frame(payload);
                }
                warn!("Eurobraille packet real size exceeds declared size");
                debug!("discarded byte: {byte:02X}");
                self.state = EurobrailleState::Resync;
            }

            EurobrailleState::Resync => {
                if byte == ETX {
                    self.state = EurobrailleState::Idle;
                } else {
                    debug!("discarded byte while resynchronising: {byte:02X}");
                }
            }
        }
        DecodeStep::Pending
    }

    fn in_frame(&self) -> bool {
        self.state != EurobrailleState::Idle
    }

    fn reset(&mut self) {
        self.state = EurobrailleState::Idle;
        self.expected = 0;
        self.buffer.clear();
    }
}

/// Encodes `payload` as a complete Eurobraille frame.
///
/// # Errors
///
/// Returns [`ProtocolError::EmptyPayload`] for an empty payload, whose
/// declared length of 2 no decoder accepts, and
/// [`ProtocolError::PayloadTooLarge`] if `payload.len() + 2` does not fit the
/// 16-bit length field.
///
/// # Examples
///
/// ```rust
/// use iris_core::protocol::eurobraille::encode_eurobraille;
///
/// let frame = encode_eurobraille(b"SI").unwrap();
/// assert_eq!(frame, vec![0x02, 0x00, 0x04, b'S', b'I', 0x03]);
/// ```
pub fn encode_eurobraille(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.is_empty() {
        return Err(ProtocolError::EmptyPayload);
    }
    let maximum = usize::from(u16::MAX) - LENGTH_FIELD_SIZE;
    if payload.len() > maximum {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            maximum,
        });
    }

    let declared = (payload.len() + LENGTH_FIELD_SIZE) as u16;
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(STX);
    frame.extend_from_slice(&declared.to_be_bytes());
    frame.extend_from_slice(payload);
    frame.push(ETX);
    Ok(frame)
}

/// Encodes a NUL-terminated string packet.
///
/// The terminator is part of the payload, so `"SI"` becomes a three-byte payload.
pub fn encode_eurobraille_string(text: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = Vec::with_capacity(text.len() + 1);
    payload.extend_from_slice(text);
    payload.push(0);
    encode_eurobraille(&payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(decoder: &mut EurobrailleDecoder, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes
            .iter()
            .filter_map(|&b| match decoder.push(b) {
                DecodeStep::Frame(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_system_information_request_is_decoded() {
        let mut decoder = EurobrailleDecoder::new();
        let decoded = frames(&mut decoder, &[STX, 0x00, 0x04, b'S', b'I', ETX]);
        assert_eq!(decoded, vec![b"SI".to_vec()]);
        assert!(!decoder.in_frame());
    }

    #[test]
    fn test_control_bytes_inside_payload_are_plain_data() {
        let mut decoder = EurobrailleDecoder::new();
        let decoded = frames(&mut decoder, &[STX, 0x00, 0x05, STX, ETX, 0x10, ETX]);
        assert_eq!(decoded, vec![vec![STX, ETX, 0x10]]);
    }

    #[test]
    fn test_declared_length_below_three_is_rejected() {
        // Arrange: declared length 2 means an empty payload, which is invalid
        let mut decoder = EurobrailleDecoder::new();

        // Act
        let decoded = frames(&mut decoder, &[STX, 0x00, 0x02, ETX]);

        // Assert
        assert!(decoded.is_empty());
        assert!(!decoder.in_frame());
    }

    #[test]
    fn test_declared_length_beyond_capacity_is_rejected() {
        let mut decoder = EurobrailleDecoder::new();
        let declared = (MAXIMUM_PACKET_SIZE + 3) as u16;
        let [high, low] = declared.to_be_bytes();

        let decoded = frames(&mut decoder, &[STX, high, low]);

        assert!(decoded.is_empty());
        assert!(!decoder.in_frame());
    }

    #[test]
    fn test_payload_at_capacity_is_accepted() {
        let mut decoder = EurobrailleDecoder::new();
        let payload = vec![0xAA; MAXIMUM_PACKET_SIZE];
        let frame = encode_eurobraille(&payload).unwrap();

        assert_eq!(frames(&mut decoder, &frame), vec![payload]);
    }

    #[test]
    fn test_missing_etx_enters_resync_until_next_etx() {
        // Arrange: declared one payload byte but two arrive before ETX
        let mut decoder = EurobrailleDecoder::new();

        // Act
        let first = frames(&mut decoder, &[STX, 0x00, 0x03, b'A', b'B', b'C', ETX]);
        let second = frames(&mut decoder, &[STX, 0x00, 0x03, b'D', ETX]);

        // Assert: the oversized frame is dropped, the following one survives
        assert!(first.is_empty());
        assert_eq!(second, vec![vec![b'D']]);
    }

    #[test]
    fn test_noise_before_stx_is_ignored() {
        let mut decoder = EurobrailleDecoder::new();
        let decoded = frames(&mut decoder, &[0x00, ETX, 0x41, STX, 0x00, 0x03, b'x', ETX]);
        assert_eq!(decoded, vec![vec![b'x']]);
    }

    #[test]
    fn test_encode_writes_length_including_itself() {
        let frame = encode_eurobraille(&[1, 2, 3]).unwrap();
        assert_eq!(frame, vec![STX, 0x00, 0x05, 1, 2, 3, ETX]);
    }

    #[test]
    fn test_encode_string_appends_nul_terminator() {
        let frame = encode_eurobraille_string(b"SI").unwrap();
        assert_eq!(frame, vec![STX, 0x00, 0x05, b'S', b'I', 0x00, ETX]);
    }

    #[test]
    fn test_encode_rejects_payload_over_length_field() {
        let payload = vec![0u8; usize::from(u16::MAX)];
        assert!(matches!(
            encode_eurobraille(&payload),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_empty_payload() {
        // Arrange
        let mut decoder = EurobrailleDecoder::new();

        // Act
        let result = encode_eurobraille(&[]);
        let bare = frames(&mut decoder, &[STX, 0x00, 0x02, ETX]);

        // Assert: the frame it would have produced does not decode either
        assert_eq!(result, Err(ProtocolError::EmptyPayload));
        assert!(bare.is_empty());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut decoder = EurobrailleDecoder::new();
        frames(&mut decoder, &[STX, 0x00, 0x05, b'a']);
        assert!(decoder.in_frame());

        decoder.reset();

        assert!(!decoder.in_frame());
    }
}
