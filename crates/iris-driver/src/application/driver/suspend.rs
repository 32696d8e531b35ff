//! Suspend and resume driven by the hardware latch.

use std::time::Instant;

use iris_core::protocol::packets::MENU_PACKET;
use iris_core::LatchTransition;
use tracing::info;

use super::{DriverError, IrisDriver};

impl IrisDriver {
    /// Samples the latch sensor; a hold longer than the configured delay
    /// toggles between suspended and running.
    pub fn on_latch_tick(&mut self, now: Instant) -> Result<(), DriverError> {
        let pulled = self.hardware.latch.is_pulled();
        match self.latch.update(pulled, now) {
            Some(LatchTransition::Toggle) if self.suspended => self.resume(),
            Some(LatchTransition::Toggle) => self.suspend(),
            None => Ok(()),
        }
    }

    /// Returns `true` if the latch monitor should run at all.
    pub fn latch_enabled(&self) -> bool {
        self.latch.is_enabled()
    }

    /// Blanks the display and powers the cells down.  A no-op in
    /// non-embedded mode.
    pub fn suspend(&mut self) -> Result<(), DriverError> {
        if !self.settings.embedded {
            return Ok(());
        }

        info!("suspending braille display");
        self.suspended = true;

        if self.forwarding {
            self.write_external(&MENU_PACKET)?;
        }

        let blank = vec![0; self.cells.len()];
        self.internal.write_cells(&blank)?;
        self.internal.drain()?;
        self.hardware.power.power_off();
        self.hardware.sink.set_online(false);
        Ok(())
    }

    /// Powers the cells back up.  A no-op in non-embedded mode.
    pub fn resume(&mut self) -> Result<(), DriverError> {
        if !self.settings.embedded {
            return Ok(());
        }

        info!("resuming braille display");
        self.hardware.power.power_on();
        self.suspended = false;

        if self.forwarding {
            self.write_external(&MENU_PACKET)?;
        } else {
            self.refresh = true;
            self.hardware.sink.set_online(true);
        }
        Ok(())
    }
}
