//! # iris-core
//!
//! Shared library for the Iris packet-forwarding bridge containing the two
//! serial frame codecs, the XT keyboard translation tables, and the small
//! state machines that decide how packets move between the two ports.
//!
//! It has zero dependencies on serial ports, timers, or the display hardware;
//! everything here operates on bytes and values handed in by the caller.
//!
//! # Architecture overview (for beginners)
//!
//! An Iris braille display talks to its onboard controller over an
//! *internal* serial line, and may be connected to a PC (or another device)
//! over an *external* serial line.  When the operator switches the device into
//! "PC mode", key presses from the internal line are relayed to the external
//! peer and display updates from the peer are relayed back to the hardware.
//!
//! This crate (`iris-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes are framed on each line.  The internal line
//!   (and a "native" external peer) uses `SOH … EOT` frames with `DLE`
//!   escaping; a Eurobraille peer uses length-prefixed `STX … ETX` frames.
//!
//! - **`keymap`** – The literal XT scancode table for the French (AZERTY)
//!   keyboard built into the device, plus the dead-key composite tables.
//!
//! - **`domain`** – Pure logic with no I/O: the keyboard translator that turns
//!   scancodes into Eurobraille keyboard packets, the external protocol
//!   descriptor ring, and the latch threshold monitor.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `iris_core::NativeDecoder` instead of `iris_core::protocol::native::NativeDecoder`.
pub use domain::keyboard::{KeyboardPacket, XtTranslator};
pub use domain::latch::{LatchMonitor, LatchTransition};
pub use domain::protocol::ExternalProtocol;
pub use protocol::eurobraille::{encode_eurobraille, encode_eurobraille_string, EurobrailleDecoder};
pub use protocol::native::{encode_native, NativeDecoder};
pub use protocol::packets::{InternalPacket, ProtocolError};
pub use protocol::{DecodeStep, FrameDecoder, MAXIMUM_PACKET_SIZE};
