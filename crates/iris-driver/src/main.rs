//! Iris bridge entry point.
//!
//! Loads the configuration, opens both ports, and runs the driver on a single
//! Tokio task.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- argv[1] or the platform config file
//!  └─ open_driver()            -- internal + optional external endpoint
//!  └─ select! loop
//!       ├─ internal poll tick  → IrisDriver::poll_internal
//!       ├─ external poll tick  → IrisDriver::poll_external
//!       ├─ latch timer tick    → IrisDriver::on_latch_tick
//!       └─ Ctrl-C              → shutdown
//! ```
//!
//! A transport failure or an unrecognised internal packet means the link may
//! be out of step, so the driver is shut down and opened again.

#[cfg(not(unix))]
compile_error!("iris-bridge opens its ports as Unix character devices");

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use iris_driver::application::driver::{DriverError, DriverHardware, DriverSettings, IrisDriver};
use iris_driver::infrastructure::hardware::{LoggingPower, LoggingSink, SwitchLatch};
use iris_driver::infrastructure::latch_timer::LatchTimer;
use iris_driver::infrastructure::port::pipe::PipeEndpoint;
use iris_driver::infrastructure::port::{ExternalPort, InternalPort};
use iris_driver::infrastructure::storage::config::{load_config, load_default_config, BridgeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => load_default_config()?,
    };

    // Level comes from the config file unless `RUST_LOG` is set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.driver.log_level)),
        )
        .init();

    info!("Iris bridge starting");

    let hardware = DriverHardware {
        power: Arc::new(LoggingPower::new()),
        latch: Arc::new(SwitchLatch::new()),
        sink: Arc::new(LoggingSink::new()),
    };

    let mut driver = open_driver(&config, &hardware)?;
    let mut latch_timer = LatchTimer::new(config.latch.interval());
    if driver.latch_enabled() {
        latch_timer.start();
    }

    let mut internal_tick = interval(config.timing.poll_interval());
    internal_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut external_tick = interval(config.timing.external_poll_interval());
    external_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Iris bridge ready.  Press Ctrl-C to exit.");

    loop {
        // Port reads may wait briefly for the rest of a frame.
        let result: Result<(), DriverError> = tokio::select! {
            _ = internal_tick.tick() => tokio::task::block_in_place(|| driver.poll_internal()),
            _ = external_tick.tick() => tokio::task::block_in_place(|| driver.poll_external()),
            now = latch_timer.tick() => driver.on_latch_tick(now),
            _ = &mut ctrl_c => {
                info!("shutdown signal received");
                break;
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if e.requires_restart() => {
                error!("{e}; restarting driver");
                latch_timer.cancel();
                driver.shutdown();
                driver = open_driver(&config, &hardware)?;
                if driver.latch_enabled() {
                    latch_timer.start();
                }
            }
            Err(e) => warn!("{e}"),
        }
    }

    latch_timer.cancel();
    driver.shutdown();
    info!("Iris bridge stopped");
    Ok(())
}

/// Opens the configured endpoints and builds a driver around them.
fn open_driver(config: &BridgeConfig, hardware: &DriverHardware) -> anyhow::Result<IrisDriver> {
    let internal = PipeEndpoint::open(
        &config.internal.path,
        config.internal.baud,
        Duration::from_millis(config.internal.input_timeout_ms),
    )
    .with_context(|| format!("cannot open internal port {}", config.internal.path.display()))?;

    let external = match &config.external {
        Some(port) if config.driver.embedded => {
            let endpoint = PipeEndpoint::open(
                &port.path,
                port.protocol.baud(),
                Duration::from_millis(port.input_timeout_ms),
            )
            .with_context(|| format!("cannot open external port {}", port.path.display()))?;
            Some(ExternalPort::new(Box::new(endpoint), port.protocol))
        }
        Some(_) => {
            warn!("[external] section ignored in non-embedded mode");
            None
        }
        None => None,
    };

    let settings = DriverSettings {
        embedded: config.driver.embedded,
        columns: config.driver.columns,
        serial_number: config.driver.serial_number.clone(),
        latch_delay: config.latch.delay(),
    };

    Ok(IrisDriver::new(
        settings,
        InternalPort::new(Box::new(internal)),
        external,
        hardware.clone(),
    ))
}
