//! Protocol module containing the two frame codecs and the packet catalogue.

pub mod eurobraille;
pub mod native;
pub mod packets;

pub use eurobraille::{encode_eurobraille, encode_eurobraille_string, EurobrailleDecoder};
pub use native::{encode_native, NativeDecoder};
pub use packets::{InternalPacket, ProtocolError};

/// Largest payload either decoder will accumulate for one frame.
pub const MAXIMUM_PACKET_SIZE: usize = 256;

/// Result of feeding one byte into a [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStep {
    /// The byte was consumed (stored, skipped, or discarded); no frame is complete.
    Pending,
    /// A frame was completed; the payload excludes all framing and escape bytes.
    Frame(Vec<u8>),
    /// A bare acknowledgement byte arrived outside a frame.
    Acknowledgement,
}

/// Byte-at-a-time frame decoder.
///
/// Implementations keep their parse state between calls so that a frame can
/// arrive across any number of reads.
pub trait FrameDecoder {
    /// Feeds the next received byte.
    fn push(&mut self, byte: u8) -> DecodeStep;

    /// Returns `true` while a frame has been started but not yet completed.
    fn in_frame(&self) -> bool;

    /// Abandons any partially received frame and returns to idle.
    fn reset(&mut self);
}

/// Formats bytes as space-separated hex for log output.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_formats_bytes_with_spaces() {
        assert_eq!(hex_dump(&[0x01, 0xAB, 0x04]), "01 AB 04");
    }

    #[test]
    fn test_hex_dump_of_empty_slice_is_empty() {
        assert_eq!(hex_dump(&[]), "");
    }
}
