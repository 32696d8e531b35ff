//! Requests a Eurobraille peer sends to the device.
//!
//! Only two are understood:
//!
//! - `SI` asks for system identification and is answered with a fixed
//!   sequence of packets, whether or not forwarding is active.
//! - `BS` carries a full cell image; it is mirrored into the external shadow
//!   buffer and shown on the device only while forwarding is live.

use tracing::{debug, info, warn};

use super::{DriverError, IrisDriver};
use iris_core::protocol::hex_dump;

const MODEL: &[u8] = b"SHIR4";
const HARDWARE_REVISION: &[u8] = b"SR1.1";
const CAPABILITIES: &[u8] = b"SLFR";
const DISPLAY_TYPE: u8 = 6;
const OPTIONS: [u8; 2] = [0xEF, 0xF8];
const BATTERY: u8 = 0x08;
const FIRMWARE_VERSION: &[u8] = b"SW1.92";
const PROTOCOL_VERSION: &[u8] = b"SP1.00 30-10-2006";

impl IrisDriver {
    /// Interprets one packet from a Eurobraille peer.  `live` is true while
    /// forwarding and not suspended.
    pub(super) fn handle_peer_request(&mut self, packet: &[u8], live: bool) -> Result<(), DriverError> {
        match packet {
            [b'S', b'I', ..] => self.send_identification(),
            [b'B', b'S', cells @ ..] => self.mirror_cells(cells, live),
            _ => {
                warn!("unhandled Eurobraille packet: {}", hex_dump(packet));
                Ok(())
            }
        }
    }

    fn send_identification(&mut self) -> Result<(), DriverError> {
        info!("Eurobraille peer requested system identification");
        let columns = self.settings.columns;
        let mut serial = b"SN".to_vec();
        serial.extend_from_slice(self.settings.serial_number.as_bytes());

        let Some(external) = self.external.as_mut() else {
            return Ok(());
        };

        external.write_string(MODEL)?;
        external.write_string(HARDWARE_REVISION)?;
        external.write_string(&serial)?;
        external.write_string(CAPABILITIES)?;
        external.write_packet(&[b'S', b'G', columns])?;
        external.write_packet(&[b'S', b'T', DISPLAY_TYPE])?;
        external.write_string(&[b'S', b'O', OPTIONS[0], OPTIONS[1]])?;
        external.write_string(&[b'S', b'B', BATTERY])?;
        external.write_string(FIRMWARE_VERSION)?;
        external.write_string(PROTOCOL_VERSION)?;
        external.write_string(b"SI")?;
        Ok(())
    }

    fn mirror_cells(&mut self, cells: &[u8], live: bool) -> Result<(), DriverError> {
        if cells.len() != self.external_cells.len() {
            warn!(
                "Eurobraille cell write of {} cells ignored (display has {})",
                cells.len(),
                self.external_cells.len()
            );
            return Ok(());
        }

        self.external_cells.copy_from_slice(cells);
        if live {
            self.internal.write_cells(&self.external_cells)?;
        } else {
            debug!("Eurobraille cells saved while not forwarding");
        }
        Ok(())
    }
}
