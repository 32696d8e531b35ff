//! End-to-end driver scenarios over in-memory endpoints.
//!
//! Each test builds a full [`IrisDriver`] with scripted ports and recording
//! collaborators, feeds raw wire bytes, and checks the bytes and events that
//! come out the other side.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use iris_core::protocol::packets::{ACK, DLE, EOT, ETX, SOH, STX};
use iris_core::{DecodeStep, EurobrailleDecoder, ExternalProtocol, FrameDecoder};
use iris_driver::application::dispatch::KeyEvent;
use iris_driver::application::driver::{
    DevicePower, DriverHardware, DriverSettings, InputSink, IrisDriver, LatchSensor,
};
use iris_driver::infrastructure::hardware::SwitchLatch;
use iris_driver::infrastructure::port::mock::MockEndpoint;
use iris_driver::infrastructure::port::{ExternalPort, InternalPort};

// ── Recording doubles ─────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<KeyEvent>>,
    messages: Mutex<Vec<String>>,
    online: Mutex<Vec<bool>>,
}

impl InputSink for RecordingSink {
    fn key_event(&self, event: KeyEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn message(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    fn set_online(&self, online: bool) {
        self.online.lock().unwrap().push(online);
    }
}

#[derive(Default)]
struct RecordingPower {
    calls: Mutex<Vec<&'static str>>,
}

impl DevicePower for RecordingPower {
    fn power_on(&self) {
        self.calls.lock().unwrap().push("on");
    }

    fn power_off(&self) {
        self.calls.lock().unwrap().push("off");
    }
}

struct Rig {
    driver: IrisDriver,
    internal: MockEndpoint,
    external: MockEndpoint,
    sink: Arc<RecordingSink>,
    power: Arc<RecordingPower>,
    latch: Arc<SwitchLatch>,
}

fn rig(protocol: ExternalProtocol) -> Rig {
    let internal = MockEndpoint::new();
    let external = MockEndpoint::new();
    let sink = Arc::new(RecordingSink::default());
    let power = Arc::new(RecordingPower::default());
    let latch = Arc::new(SwitchLatch::new());

    let driver = IrisDriver::new(
        DriverSettings {
            embedded: true,
            columns: 40,
            serial_number: "1234".to_string(),
            latch_delay: Duration::from_millis(1000),
        },
        InternalPort::new(Box::new(internal.clone())),
        Some(ExternalPort::new(Box::new(external.clone()), protocol)),
        DriverHardware {
            power: power.clone(),
            latch: latch.clone() as Arc<dyn LatchSensor>,
            sink: sink.clone(),
        },
    );

    Rig {
        driver,
        internal,
        external,
        sink,
        power,
        latch,
    }
}

fn eurobraille_packets(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut decoder = EurobrailleDecoder::new();
    bytes
        .iter()
        .filter_map(|&byte| match decoder.push(byte) {
            DecodeStep::Frame(payload) => Some(payload),
            _ => None,
        })
        .collect()
}

const MENU: [u8; 4] = [SOH, b'I', b'Q', EOT];

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn test_routing_key_in_local_mode_reaches_sink() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Eurobraille);
    rig.internal.push_input(&[SOH, b'I', 0x01, EOT]);

    // Act
    rig.driver.poll_internal().unwrap();

    // Assert
    assert_eq!(*rig.sink.events.lock().unwrap(), vec![KeyEvent::RoutingKey(0)]);
    assert!(rig.external.take_output().is_empty());
}

#[test]
fn test_menu_key_starts_eurobraille_forwarding() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Eurobraille);
    let mut image = vec![0u8; 40];
    image[0] = 0x1F;
    image[39] = 0xC0;
    rig.driver.write_window(&image).unwrap();
    rig.internal.push_input(&MENU);

    // Act
    rig.driver.poll_internal().unwrap();

    // Assert
    assert!(rig.driver.is_forwarding());
    let mut expected = b"BS".to_vec();
    expected.extend_from_slice(&image);
    assert_eq!(eurobraille_packets(&rig.external.take_output()), vec![expected]);
    assert_eq!(*rig.sink.messages.lock().unwrap(), vec!["PC mode (Eurobraille)".to_string()]);
    assert_eq!(rig.sink.online.lock().unwrap().last(), Some(&false));
}

#[test]
fn test_identification_answered_while_not_forwarding() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Eurobraille);
    rig.internal.take_output();
    rig.external.push_input(&[STX, 0x00, 0x04, b'S', b'I', ETX]);

    // Act
    rig.driver.poll_external().unwrap();

    // Assert
    let replies = eurobraille_packets(&rig.external.take_output());
    assert_eq!(replies.len(), 11);
    assert_eq!(replies[0], b"SHIR4\0".to_vec());
    assert_eq!(replies[2], b"SN1234\0".to_vec());
    assert_eq!(replies[4], vec![b'S', b'G', 40]);
    assert_eq!(replies[10], b"SI\0".to_vec());
    assert!(rig.internal.take_output().is_empty());
}

#[test]
fn test_latch_held_suspends_exactly_once() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Eurobraille);
    rig.latch.set_pulled(true);
    let start = Instant::now();

    // Act: 1200 ms of continuous pull sampled every 100 ms
    for tick in 0..=12u64 {
        rig.driver
            .on_latch_tick(start + Duration::from_millis(tick * 100))
            .unwrap();
    }

    // Assert
    assert!(rig.driver.is_suspended());
    assert_eq!(*rig.power.calls.lock().unwrap(), vec!["off"]);
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn test_menu_twice_returns_to_local_with_both_hooks() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Native);
    rig.internal.push_input(&MENU);
    rig.internal.push_input(&MENU);

    // Act
    rig.driver.poll_internal().unwrap();

    // Assert
    assert!(!rig.driver.is_forwarding());
    assert_eq!(rig.external.take_output(), [MENU, MENU].concat());
    assert_eq!(*rig.sink.online.lock().unwrap(), vec![false, true]);
}

#[test]
fn test_truncated_frame_then_valid_frame_decodes_once() {
    // Arrange: a routing key cut short, a read timeout, then a full one
    let mut rig = rig(ExternalProtocol::Eurobraille);
    rig.internal.push_input(&[SOH, b'I']);
    rig.internal.push_gap();
    rig.internal.push_input(&[SOH, b'I', 0x05, EOT]);

    // Act
    rig.driver.poll_internal().unwrap();
    rig.driver.poll_internal().unwrap();

    // Assert
    assert_eq!(*rig.sink.events.lock().unwrap(), vec![KeyEvent::RoutingKey(4)]);
}

#[test]
fn test_native_round_trip_through_forwarding() {
    // Arrange
    let mut rig = rig(ExternalProtocol::Native);
    rig.internal.push_input(&MENU);
    rig.driver.poll_internal().unwrap();
    rig.external.take_output();

    // Act: an escaped key packet in, a cell write and its ACK back
    rig.internal.push_input(&[SOH, b'X', 0x00, DLE, 0x04, EOT]);
    rig.driver.poll_internal().unwrap();
    rig.external.push_input(&[SOH, b'B', 0xAA, EOT]);
    rig.driver.poll_external().unwrap();
    rig.internal.push_input(&[ACK]);
    rig.driver.poll_internal().unwrap();

    // Assert
    assert_eq!(
        rig.external.take_output(),
        vec![SOH, b'X', 0x00, DLE, 0x04, EOT, ACK]
    );
    assert_eq!(rig.internal.take_output(), vec![SOH, b'B', 0xAA, EOT]);
}

#[test]
fn test_shutdown_after_suspend() {
    let mut rig = rig(ExternalProtocol::Eurobraille);
    rig.driver.suspend().unwrap();

    rig.driver.shutdown();

    assert!(rig.internal.is_disconnected());
    assert!(rig.external.is_disconnected());
    assert_eq!(*rig.power.calls.lock().unwrap(), vec!["off", "off"]);
}
