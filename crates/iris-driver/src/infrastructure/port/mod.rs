//! Byte-stream ports towards the onboard controller and the external peer.
//!
//! Each port owns an endpoint (the raw byte channel) and the frame decoder of
//! the protocol spoken on it.  Reading is byte-at-a-time: before a frame has
//! started the endpoint is only polled, while a frame is in progress each
//! read waits up to the endpoint's input timeout for the next byte.  A frame
//! whose next byte never arrives is abandoned so that the following frame
//! decodes cleanly.
//!
//! # Testability
//!
//! The [`ByteEndpoint`] trait lets unit and integration tests script the
//! bytes a port receives with [`mock::MockEndpoint`] instead of opening a
//! device.

use std::io;

use iris_core::protocol::hex_dump;
use iris_core::protocol::packets::{output_type, ProtocolError, ACK};
use iris_core::{
    encode_eurobraille, encode_eurobraille_string, encode_native, DecodeStep, EurobrailleDecoder,
    ExternalProtocol, FrameDecoder, NativeDecoder, MAXIMUM_PACKET_SIZE,
};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

pub mod mock;
#[cfg(unix)]
pub mod pipe;

/// Raw byte channel consumed by a port.
pub trait ByteEndpoint: Send {
    /// Reads one byte.
    ///
    /// With `wait` the call may block up to the endpoint's input timeout;
    /// without it the call returns immediately.  `Ok(None)` means no byte
    /// was available.
    fn read_byte(&mut self, wait: bool) -> io::Result<Option<u8>>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Changes the line speed.
    fn reconfigure(&mut self, baud: u32) -> io::Result<()>;

    /// Blocks until all written bytes have been sent.
    fn drain(&mut self) -> io::Result<()>;

    fn disconnect(&mut self);
}

/// Errors raised by port I/O.
#[derive(Debug, Error)]
pub enum PortError {
    /// Reading or writing the endpoint failed.
    #[error("{port} port I/O error: {source}")]
    Io {
        port: &'static str,
        #[source]
        source: io::Error,
    },

    /// The endpoint refused a new line speed.
    #[error("cannot set {port} port to {baud} baud: {source}")]
    Reconfigure {
        port: &'static str,
        baud: u32,
        #[source]
        source: io::Error,
    },

    /// The payload cannot be framed.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// One item read from a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortInput {
    /// A complete, non-empty packet payload.
    Packet(Vec<u8>),
    /// A bare acknowledgement byte.
    Acknowledgement,
}

// ── Channel ───────────────────────────────────────────────────────────────────

/// An endpoint paired with the decoder of the protocol spoken on it.
pub struct Channel<D> {
    name: &'static str,
    endpoint: Box<dyn ByteEndpoint>,
    decoder: D,
    capacity: usize,
}

impl<D: FrameDecoder> Channel<D> {
    pub fn new(name: &'static str, endpoint: Box<dyn ByteEndpoint>, decoder: D) -> Self {
        Self {
            name,
            endpoint,
            decoder,
            capacity: MAXIMUM_PACKET_SIZE,
        }
    }

    /// Limits the size of packets handed to the caller; larger ones are dropped.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Reads bytes until a packet or an acknowledgement is complete.
    ///
    /// Returns `Ok(None)` when no more input is available.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Io`] if the endpoint fails for any reason other
    /// than "no data".
    pub fn read_input(&mut self) -> Result<Option<PortInput>, PortError> {
        loop {
            let waiting = self.decoder.in_frame();

            let byte = match self.endpoint.read_byte(waiting) {
                Ok(Some(byte)) => byte,
                Ok(None) => return Ok(self.no_input(waiting)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(self.no_input(waiting)),
                Err(source) => {
                    error!("{} port read failed: {source}", self.name);
                    return Err(PortError::Io {
                        port: self.name,
                        source,
                    });
                }
            };

            match self.decoder.push(byte) {
                DecodeStep::Pending => {}
                DecodeStep::Acknowledgement => return Ok(Some(PortInput::Acknowledgement)),
                DecodeStep::Frame(payload) if payload.is_empty() => {
                    debug!("{} port: empty packet ignored", self.name);
                }
                DecodeStep::Frame(payload) if payload.len() > self.capacity => {
                    warn!(
                        "{} port: packet buffer too small: {} > {}",
                        self.name,
                        payload.len(),
                        self.capacity
                    );
                }
                DecodeStep::Frame(payload) => {
                    debug!("{} port packet: {}", self.name, hex_dump(&payload));
                    return Ok(Some(PortInput::Packet(payload)));
                }
            }
        }
    }

    fn no_input(&mut self, waiting: bool) -> Option<PortInput> {
        if waiting {
            warn!("{} port: partial packet abandoned", self.name);
            self.decoder.reset();
        }
        None
    }

    /// Writes an already framed buffer.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), PortError> {
        trace!("{} port write: {}", self.name, hex_dump(frame));
        self.endpoint.write_all(frame).map_err(|source| {
            error!("{} port write failed: {source}", self.name);
            PortError::Io {
                port: self.name,
                source,
            }
        })
    }

    pub fn drain(&mut self) -> Result<(), PortError> {
        self.endpoint.drain().map_err(|source| PortError::Io {
            port: self.name,
            source,
        })
    }

    pub fn reconfigure(&mut self, baud: u32) -> Result<(), PortError> {
        self.endpoint
            .reconfigure(baud)
            .map_err(|source| PortError::Reconfigure {
                port: self.name,
                baud,
                source,
            })
    }

    pub fn disconnect(&mut self) {
        debug!("{} port disconnected", self.name);
        self.endpoint.disconnect();
    }

    fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }
}

// ── Internal port ─────────────────────────────────────────────────────────────

/// Port towards the onboard controller, always framed with the native codec.
pub struct InternalPort {
    channel: Channel<NativeDecoder>,
}

impl InternalPort {
    pub fn new(endpoint: Box<dyn ByteEndpoint>) -> Self {
        Self {
            channel: Channel::new("internal", endpoint, NativeDecoder::new()),
        }
    }

    pub fn read_input(&mut self) -> Result<Option<PortInput>, PortError> {
        let input = self.channel.read_input()?;
        if input == Some(PortInput::Acknowledgement) {
            trace!("internal port acknowledgement");
        }
        Ok(input)
    }

    /// Frames and writes a message the controller will acknowledge.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<(), PortError> {
        self.channel.write_frame(&encode_native(payload))
    }

    /// Writes a full cell image.
    pub fn write_cells(&mut self, cells: &[u8]) -> Result<(), PortError> {
        let mut payload = Vec::with_capacity(cells.len() + 1);
        payload.push(output_type::WRITE_BRAILLE);
        payload.extend_from_slice(cells);
        self.write_message(&payload)
    }

    pub fn drain(&mut self) -> Result<(), PortError> {
        self.channel.drain()
    }

    pub fn disconnect(&mut self) {
        self.channel.disconnect();
    }
}

// ── External port ─────────────────────────────────────────────────────────────

/// Decoder of whichever protocol is active on the external port.
pub enum ExternalDecoder {
    Eurobraille(EurobrailleDecoder),
    Native(NativeDecoder),
}

impl ExternalDecoder {
    pub fn for_protocol(protocol: ExternalProtocol) -> Self {
        match protocol {
            ExternalProtocol::Eurobraille => ExternalDecoder::Eurobraille(EurobrailleDecoder::new()),
            ExternalProtocol::Native => ExternalDecoder::Native(NativeDecoder::new()),
        }
    }
}

impl FrameDecoder for ExternalDecoder {
    fn push(&mut self, byte: u8) -> DecodeStep {
        match self {
            ExternalDecoder::Eurobraille(decoder) => decoder.push(byte),
            ExternalDecoder::Native(decoder) => decoder.push(byte),
        }
    }

    fn in_frame(&self) -> bool {
        match self {
            ExternalDecoder::Eurobraille(decoder) => decoder.in_frame(),
            ExternalDecoder::Native(decoder) => decoder.in_frame(),
        }
    }

    fn reset(&mut self) {
        match self {
            ExternalDecoder::Eurobraille(decoder) => decoder.reset(),
            ExternalDecoder::Native(decoder) => decoder.reset(),
        }
    }
}

/// Port towards the PC or downstream device.
pub struct ExternalPort {
    channel: Channel<ExternalDecoder>,
    protocol: ExternalProtocol,
}

impl ExternalPort {
    /// Wraps `endpoint`, which must already run at `protocol.baud()`.
    pub fn new(endpoint: Box<dyn ByteEndpoint>, protocol: ExternalProtocol) -> Self {
        Self {
            channel: Channel::new("external", endpoint, ExternalDecoder::for_protocol(protocol)),
            protocol,
        }
    }

    pub fn protocol(&self) -> ExternalProtocol {
        self.protocol
    }

    /// Switches protocol and line speed.
    ///
    /// The protocol changes even if the endpoint rejects the new speed.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Reconfigure`] if the speed change failed.
    pub fn set_protocol(&mut self, protocol: ExternalProtocol) -> Result<(), PortError> {
        info!("external protocol: {} ({} baud)", protocol.name(), protocol.baud());
        self.protocol = protocol;
        *self.channel.decoder_mut() = ExternalDecoder::for_protocol(protocol);
        self.channel.reconfigure(protocol.baud())
    }

    pub fn read_input(&mut self) -> Result<Option<PortInput>, PortError> {
        self.channel.read_input()
    }

    /// Frames `payload` for the active protocol and writes it.
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<(), PortError> {
        let frame = match self.protocol {
            ExternalProtocol::Eurobraille => encode_eurobraille(payload)?,
            ExternalProtocol::Native => encode_native(payload),
        };
        self.channel.write_frame(&frame)
    }

    /// Writes a NUL-terminated Eurobraille string packet.
    pub fn write_string(&mut self, text: &[u8]) -> Result<(), PortError> {
        let frame = encode_eurobraille_string(text)?;
        self.channel.write_frame(&frame)
    }

    /// Echoes a bare acknowledgement byte.
    pub fn write_acknowledgement(&mut self) -> Result<(), PortError> {
        self.channel.write_frame(&[ACK])
    }

    pub fn drain(&mut self) -> Result<(), PortError> {
        self.channel.drain()
    }

    pub fn disconnect(&mut self) {
        self.channel.disconnect();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
