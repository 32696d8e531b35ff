//! Application layer of the Iris bridge.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the pure rules in `iris-core` (codecs,
//! key tables, latch thresholds) and the infrastructure (byte endpoints,
//! configuration files, the event loop in `main.rs`).  It decides what each
//! packet *means* for the device right now, and depends only on traits, so
//! every decision can be tested with in-memory endpoints.
//!
//! # Sub-modules
//!
//! - **`dispatch`** – Classifies a decoded internal packet (routing key,
//!   XT scancode, linear or braille keys, cycle key) and calls the matching
//!   handler of a [`dispatch::KeyHandlers`] set.
//!
//! - **`driver`** – The per-device state machine: local vs. forwarding mode,
//!   the suspended flag, the cell shadow buffers, the Eurobraille peer
//!   requests, and suspend/resume on the latch.

pub mod dispatch;
pub mod driver;
