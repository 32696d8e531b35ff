//! Infrastructure layer of the Iris bridge.
//!
//! Contains the adapters that touch the outside world: byte endpoints and
//! the ports built on them, the latch timer, stand-in hardware collaborators,
//! and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `iris_core`, and the
//! application layer only reaches it through the port types and traits.

pub mod hardware;
pub mod latch_timer;
pub mod port;
pub mod storage;
