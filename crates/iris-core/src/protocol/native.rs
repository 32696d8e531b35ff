//! Native frame codec used on the internal line and towards a native peer.
//!
//! Wire format:
//! ```text
//! SOH <payload, DLE-escaped> EOT
//! ```
//! Any payload byte in `{SOH, EOT, DLE, ACK, NAK}` is preceded by `DLE` on the
//! wire.  A bare `ACK` outside a frame acknowledges the previous message.
//!
//! # Decoder states (for beginners)
//!
//! The decoder is a two-state machine:
//!
//! | State   | Byte               | Action                                   |
//! |---------|--------------------|------------------------------------------|
//! | Idle    | `SOH`              | start a frame                            |
//! | Idle    | `ACK`              | report an acknowledgement                |
//! | Idle    | anything else      | ignore                                   |
//! | InFrame | `DLE` (unescaped)  | remember the escape, store nothing       |
//! | InFrame | `EOT` (unescaped)  | the frame is complete                    |
//! | InFrame | anything else      | store it (an escaped `EOT` lands here)   |

use tracing::{debug, trace, warn};

use super::packets::{ACK, DLE, EOT, NAK, SOH};
use super::{hex_dump, DecodeStep, FrameDecoder, MAXIMUM_PACKET_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeState {
    Idle,
    InFrame,
}

/// Incremental decoder for `SOH … EOT` frames.
#[derive(Debug)]
pub struct NativeDecoder {
    state: NativeState,
    escape: bool,
    truncated: bool,
    buffer: Vec<u8>,
}

impl NativeDecoder {
    pub fn new() -> Self {
        Self {
            state: NativeState::Idle,
            escape: false,
            truncated: false,
            buffer: Vec::with_capacity(MAXIMUM_PACKET_SIZE),
        }
    }

    fn start_frame(&mut self) {
        self.state = NativeState::InFrame;
        self.escape = false;
        self.truncated = false;
        self.buffer.clear();
    }

    fn store(&mut self, byte: u8) {
        self.escape = false;
        if self.buffer.len() < MAXIMUM_PACKET_SIZE {
            self.buffer.push(byte);
        } else {
            if !self.truncated {
                warn!("native packet truncated at {MAXIMUM_PACKET_SIZE} bytes");
                self.truncated = true;
            }
            trace!("native byte discarded: {byte:02X}");
        }
    }
}

impl Default for NativeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for NativeDecoder {
    fn push(&mut self, byte: u8) -> DecodeStep {
        match self.state {
            NativeState::Idle => match byte {
                SOH => {
                    self.start_frame();
                    DecodeStep::Pending
                }
                ACK => DecodeStep::Acknowledgement,
                _ => {
                    debug!("ignored byte outside native frame: {byte:02X}");
                    DecodeStep::Pending
                }
            },

            NativeState::InFrame => {
                if byte == DLE && !self.escape {
                    self.escape = true;
                    return DecodeStep::Pending;
                }

                if byte == EOT && !self.escape {
                    self.state = NativeState::Idle;
                    let payload = std::mem::take(&mut self.buffer);
                    trace!("native packet received: {}", hex_dump(&payload));
                    return DecodeStep::Frame(payload);
                }

                self.store(byte);
                DecodeStep::Pending
            }
        }
    }

    fn in_frame(&self) -> bool {
        self.state == NativeState::InFrame
    }

    fn reset(&mut self) {
        self.state = NativeState::Idle;
        self.escape = false;
        self.truncated = false;
        self.buffer.clear();
    }
}

/// Returns `true` if `byte` must be preceded by `DLE` inside a native frame.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, SOH | EOT | DLE | ACK | NAK)
}

/// Encodes `payload` as a complete native frame.
///
/// # Examples
///
/// ```rust
/// use iris_core::protocol::native::encode_native;
///
/// assert_eq!(encode_native(&[b'I', 0x04]), vec![0x01, b'I', 0x10, 0x04, 0x04]);
/// ```
pub fn encode_native(payload: &[u8]) -> Vec<u8> {
    // Worst case every byte is escaped.
    let mut frame = Vec::with_capacity(payload.len() * 2 + 2);
    frame.push(SOH);
    for &byte in payload {
        if needs_escape(byte) {
            frame.push(DLE);
        }
        frame.push(byte);
    }
    frame.push(EOT);
    frame
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut NativeDecoder, bytes: &[u8]) -> Vec<DecodeStep> {
        bytes
            .iter()
            .map(|&b| decoder.push(b))
            .filter(|step| *step != DecodeStep::Pending)
            .collect()
    }

    #[test]
    fn test_plain_frame_is_decoded() {
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[SOH, b'I', b'Q', EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(b"IQ".to_vec())]);
        assert!(!decoder.in_frame());
    }

    #[test]
    fn test_unescaped_soh_inside_frame_is_data() {
        // SOH 'I' 0x01 EOT: the routing key for column 0, sent without escapes
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[SOH, b'I', 0x01, EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(vec![b'I', 0x01])]);
    }

    #[test]
    fn test_escaped_eot_is_stored_not_terminating() {
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[SOH, b'A', DLE, EOT, b'B', EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(vec![b'A', EOT, b'B'])]);
    }

    #[test]
    fn test_double_dle_yields_one_dle() {
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[SOH, DLE, DLE, EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(vec![DLE])]);
    }

    #[test]
    fn test_ack_outside_frame_is_reported() {
        let mut decoder = NativeDecoder::new();
        assert_eq!(decoder.push(ACK), DecodeStep::Acknowledgement);
    }

    #[test]
    fn test_ack_inside_frame_is_data() {
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[SOH, ACK, EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(vec![ACK])]);
    }

    #[test]
    fn test_noise_before_soh_is_ignored() {
        let mut decoder = NativeDecoder::new();
        let steps = feed(&mut decoder, &[0x55, EOT, 0xFF, SOH, b'Z', EOT]);
        assert_eq!(steps, vec![DecodeStep::Frame(vec![b'Z'])]);
    }

    #[test]
    fn test_empty_frame_decodes_to_empty_payload() {
        let mut decoder = NativeDecoder::new();
        assert_eq!(feed(&mut decoder, &[SOH, EOT]), vec![DecodeStep::Frame(vec![])]);
    }

    #[test]
    fn test_oversized_frame_is_truncated_to_maximum() {
        // Arrange
        let mut decoder = NativeDecoder::new();
        let mut bytes = vec![SOH];
        bytes.extend(std::iter::repeat(b'x').take(MAXIMUM_PACKET_SIZE + 10));
        bytes.push(EOT);

        // Act
        let steps = feed(&mut decoder, &bytes);

        // Assert
        assert_eq!(steps.len(), 1);
        match &steps[0] {
            DecodeStep::Frame(payload) => assert_eq!(payload.len(), MAXIMUM_PACKET_SIZE),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn test_reset_abandons_partial_frame() {
        let mut decoder = NativeDecoder::new();
        feed(&mut decoder, &[SOH, b'a', b'b']);
        assert!(decoder.in_frame());

        decoder.reset();

        assert!(!decoder.in_frame());
        assert_eq!(feed(&mut decoder, &[b'c', EOT]), vec![]);
    }

    #[test]
    fn test_encode_escapes_every_control_byte() {
        let frame = encode_native(&[SOH, EOT, DLE, ACK, NAK, b'a']);
        assert_eq!(
            frame,
            vec![SOH, DLE, SOH, DLE, EOT, DLE, DLE, DLE, ACK, DLE, NAK, b'a', EOT]
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode_native(&[]), vec![SOH, EOT]);
    }

    #[test]
    fn test_needs_escape_only_for_control_set() {
        let escaped: Vec<u8> = (0u8..=255).filter(|&b| needs_escape(b)).collect();
        assert_eq!(escaped, vec![SOH, EOT, ACK, DLE, NAK]);
    }
}
