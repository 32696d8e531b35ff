//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the path given
//! on the command line or the platform configuration directory, writes it
//! back, and falls back to defaults when the file does not exist yet.

pub mod config;
