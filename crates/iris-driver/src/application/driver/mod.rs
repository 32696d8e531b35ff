//! IrisDriver: the packet forwarding state machine.
//!
//! The driver sits between the onboard controller (internal port) and an
//! optional PC or downstream device (external port).  In *local* mode the
//! onboard keys are interpreted by the driver itself.  Pressing the menu key
//! switches to *forwarding* mode, where key packets are relayed to the
//! external peer and display writes from the peer reach the cells.  A third,
//! orthogonal flag, *suspended*, is set while the hardware latch has powered
//! the device down.
//!
//! # Architecture
//!
//! The driver depends only on the port types and on collaborator traits
//! (`DevicePower`, `LatchSensor`, `InputSink`) injected at construction,
//! so every transition can be unit tested with in-memory endpoints.
//!
//! ```text
//!  internal port ──► poll_internal ──┬─ menu key ─────► toggle_forwarding
//!                                    ├─ forwarding ───► forward_internal ──► external port
//!                                    └─ local ────────► dispatch(LocalKeys) ──► InputSink
//!
//!  external port ──► poll_external ──► native: pass through ──► internal port
//!                                    └ Eurobraille: SI / BS interpreter
//! ```

use std::sync::Arc;
use std::time::Duration;

use iris_core::protocol::packets::{is_menu_packet, ProtocolError, MENU_PACKET};
use iris_core::{ExternalProtocol, LatchMonitor, XtTranslator};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::dispatch::{dispatch, KeyEvent};
use crate::infrastructure::port::{ExternalPort, InternalPort, PortError, PortInput};

mod keys;
mod peer;
mod suspend;

use keys::{EurobrailleKeys, LocalKeys};

/// Error type for driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DriverError {
    /// Returns `true` if the link may be desynchronised and the driver must
    /// be torn down and reopened.
    pub fn requires_restart(&self) -> bool {
        match self {
            DriverError::Port(PortError::Io { .. }) => true,
            DriverError::Port(PortError::Reconfigure { .. }) => false,
            DriverError::Port(PortError::Encode(_)) => false,
            DriverError::Protocol(ProtocolError::UnexpectedPacket(_)) => true,
            DriverError::Protocol(ProtocolError::PayloadTooLarge { .. }) => false,
            DriverError::Protocol(ProtocolError::EmptyPayload) => false,
        }
    }
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Power control of the braille cells.
#[cfg_attr(test, mockall::automock)]
pub trait DevicePower: Send + Sync {
    fn power_on(&self);
    fn power_off(&self);
}

/// The hardware latch line.
#[cfg_attr(test, mockall::automock)]
pub trait LatchSensor: Send + Sync {
    /// Returns `true` while the latch reads "pulled".
    fn is_pulled(&self) -> bool;
}

/// Receiver of local input and status changes.
#[cfg_attr(test, mockall::automock)]
pub trait InputSink: Send + Sync {
    fn key_event(&self, event: KeyEvent);
    /// Shows a short message to the operator.
    fn message(&self, text: &str);
    fn set_online(&self, online: bool);
}

/// The collaborators a driver is built with.
#[derive(Clone)]
pub struct DriverHardware {
    pub power: Arc<dyn DevicePower>,
    pub latch: Arc<dyn LatchSensor>,
    pub sink: Arc<dyn InputSink>,
}

/// Fixed per-device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    pub embedded: bool,
    pub columns: u8,
    pub serial_number: String,
    /// Zero disables the latch monitor.
    pub latch_delay: Duration,
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Per-device driver state.
pub struct IrisDriver {
    settings: DriverSettings,
    internal: InternalPort,
    external: Option<ExternalPort>,
    forwarding: bool,
    suspended: bool,
    connected: bool,
    /// Cell image written by the local screen reader.
    cells: Vec<u8>,
    refresh: bool,
    /// Cell image last written by a Eurobraille peer.
    external_cells: Vec<u8>,
    keyboard: XtTranslator,
    latch: LatchMonitor,
    hardware: DriverHardware,
}

impl IrisDriver {
    /// Creates a driver; the external port is only used in embedded mode.
    pub fn new(
        settings: DriverSettings,
        internal: InternalPort,
        external: Option<ExternalPort>,
        hardware: DriverHardware,
    ) -> Self {
        let external = match external {
            Some(_) if !settings.embedded => {
                warn!("external port ignored in non-embedded mode");
                None
            }
            other => other,
        };
        let columns = usize::from(settings.columns);

        info!(
            "Iris driver: {} mode, {columns} columns",
            if settings.embedded { "embedded" } else { "non-embedded" }
        );

        Self {
            latch: LatchMonitor::new(settings.latch_delay),
            settings,
            internal,
            external,
            forwarding: false,
            suspended: false,
            connected: true,
            cells: vec![0; columns],
            refresh: true,
            external_cells: vec![0; columns],
            keyboard: XtTranslator::new(),
            hardware,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.settings.embedded
    }

    pub fn is_forwarding(&self) -> bool {
        self.forwarding
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The active external protocol, if an external port is attached.
    pub fn protocol(&self) -> Option<ExternalProtocol> {
        self.external.as_ref().map(ExternalPort::protocol)
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn external_cells(&self) -> &[u8] {
        &self.external_cells
    }

    /// Embedded: offline while forwarding or suspended.  Non-embedded:
    /// offline while the host is disconnected.
    pub fn is_offline(&self) -> bool {
        if self.settings.embedded {
            self.forwarding || self.suspended
        } else {
            !self.connected
        }
    }

    fn notify_online(&self) {
        self.hardware.sink.set_online(!self.is_offline());
    }

    // ── Display output ────────────────────────────────────────────────────────

    /// Updates the local cell image and writes it if it changed or a refresh
    /// is pending.  Nothing is written while offline.
    pub fn write_window(&mut self, cells: &[u8]) -> Result<(), DriverError> {
        let mut image = cells.to_vec();
        image.resize(self.cells.len(), 0);

        if image != self.cells {
            self.cells = image;
            self.refresh = true;
        }

        if self.refresh && !self.is_offline() {
            self.internal.write_cells(&self.cells)?;
            self.refresh = false;
        }
        Ok(())
    }

    // ── Internal port ─────────────────────────────────────────────────────────

    /// Processes every packet currently available on the internal port.
    ///
    /// # Errors
    ///
    /// Stops at the first error; see [`DriverError::requires_restart`].
    pub fn poll_internal(&mut self) -> Result<(), DriverError> {
        loop {
            if self.settings.embedded && self.suspended {
                return Ok(());
            }

            let Some(input) = self.internal.read_input()? else {
                return Ok(());
            };

            match input {
                PortInput::Acknowledgement => self.forward_acknowledgement()?,
                PortInput::Packet(packet) if self.settings.embedded => {
                    self.handle_embedded_packet(&packet)?;
                }
                PortInput::Packet(packet) => self.handle_host_packet(&packet)?,
            }
        }
    }

    fn forward_acknowledgement(&mut self) -> Result<(), DriverError> {
        if !self.forwarding {
            return Ok(());
        }
        if let Some(external) = self.external.as_mut() {
            if external.protocol().forwards_acknowledgements() {
                external.write_acknowledgement()?;
            }
        }
        Ok(())
    }

    fn handle_embedded_packet(&mut self, packet: &[u8]) -> Result<(), DriverError> {
        if is_menu_packet(packet) {
            return self.toggle_forwarding();
        }

        let columns = self.settings.columns;
        if !self.forwarding {
            return dispatch(packet, columns, &mut LocalKeys(self));
        }

        match self.protocol() {
            Some(ExternalProtocol::Native) => self.write_external(packet),
            Some(ExternalProtocol::Eurobraille) => dispatch(packet, columns, &mut EurobrailleKeys(self)),
            None => Ok(()),
        }
    }

    /// Non-embedded mode: the menu key signals the host link going down or
    /// up, and any other packet implies the link is up.
    fn handle_host_packet(&mut self, packet: &[u8]) -> Result<(), DriverError> {
        if is_menu_packet(packet) {
            self.set_connected(!self.connected);
            return Ok(());
        }
        if !self.connected {
            self.set_connected(true);
        }
        dispatch(packet, self.settings.columns, &mut LocalKeys(self))
    }

    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if connected {
            info!("host reconnected");
            self.refresh = true;
        } else {
            info!("host disconnected");
        }
        self.notify_online();
    }

    // ── Forwarding mode ───────────────────────────────────────────────────────

    /// Switches between local and forwarding mode.
    pub fn toggle_forwarding(&mut self) -> Result<(), DriverError> {
        let Some(protocol) = self.protocol() else {
            warn!("menu key ignored: no external port");
            return Ok(());
        };

        if self.forwarding {
            info!("packet forwarding stopped");
            self.end_forwarding(protocol)?;
            self.forwarding = false;
            self.refresh = true;
        } else {
            info!("packet forwarding started ({})", protocol.name());
            self.hardware
                .sink
                .message(&format!("PC mode ({})", protocol.name()));
            self.begin_forwarding(protocol)?;
            self.forwarding = true;
        }

        self.notify_online();
        Ok(())
    }

    fn begin_forwarding(&mut self, protocol: ExternalProtocol) -> Result<(), DriverError> {
        match protocol {
            ExternalProtocol::Eurobraille => {
                self.keyboard.reset();
                let mut packet = b"BS".to_vec();
                packet.extend_from_slice(&self.cells);
                self.write_external(&packet)
            }
            ExternalProtocol::Native => self.write_external(&MENU_PACKET),
        }
    }

    fn end_forwarding(&mut self, protocol: ExternalProtocol) -> Result<(), DriverError> {
        match protocol {
            ExternalProtocol::Eurobraille => Ok(()),
            ExternalProtocol::Native => self.write_external(&MENU_PACKET),
        }
    }

    fn write_external(&mut self, packet: &[u8]) -> Result<(), DriverError> {
        if let Some(external) = self.external.as_mut() {
            external.write_packet(packet)?;
        }
        Ok(())
    }

    /// Steps the external protocol and reconfigures the external line.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Reconfigure`] (wrapped) if the new line speed
    /// could not be applied; the protocol has changed regardless.
    pub fn cycle_protocol(&mut self) -> Result<(), DriverError> {
        let Some(external) = self.external.as_mut() else {
            debug!("cycle key ignored: no external port");
            return Ok(());
        };

        let next = external.protocol().next();
        external.set_protocol(next)?;
        self.hardware
            .sink
            .message(&format!("external protocol: {}", next.name()));
        Ok(())
    }

    // ── External port ─────────────────────────────────────────────────────────

    /// Processes every packet currently available on the external port.
    pub fn poll_external(&mut self) -> Result<(), DriverError> {
        loop {
            let Some(external) = self.external.as_mut() else {
                return Ok(());
            };
            let protocol = external.protocol();

            let Some(input) = external.read_input()? else {
                return Ok(());
            };

            let packet = match input {
                PortInput::Packet(packet) => packet,
                PortInput::Acknowledgement => {
                    debug!("external acknowledgement ignored");
                    continue;
                }
            };

            let live = self.forwarding && !self.suspended;
            match protocol {
                ExternalProtocol::Native if live => self.internal.write_message(&packet)?,
                ExternalProtocol::Native => debug!("native packet dropped while not forwarding"),
                ExternalProtocol::Eurobraille => self.handle_peer_request(&packet, live)?,
            }
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Best-effort shutdown: blank the display, drain, power off, and close
    /// both endpoints.  Failures are logged, not returned.
    pub fn shutdown(&mut self) {
        info!("Iris driver shutting down");

        let blank = vec![0; self.cells.len()];
        if let Err(e) = self.internal.write_cells(&blank) {
            warn!("could not blank display: {e}");
        }
        if let Err(e) = self.internal.drain() {
            warn!("could not drain internal port: {e}");
        }
        if self.settings.embedded {
            self.hardware.power.power_off();
        }

        if let Some(mut external) = self.external.take() {
            external.disconnect();
        }
        self.internal.disconnect();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
