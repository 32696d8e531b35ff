//! Domain logic for the Iris bridge.
//!
//! This module contains pure state machines with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! Everything in `domain` can be driven from a unit test by handing in bytes,
//! booleans, and timestamps.  Nothing here opens a serial port, sleeps, or
//! talks to the display hardware; the driver crate owns those concerns and
//! calls into these types.

/// XT scancode to Eurobraille keyboard packet translation.
pub mod keyboard;

/// Latch threshold detection.
pub mod latch;

/// The closed set of protocols a peer on the external line may speak.
pub mod protocol;
