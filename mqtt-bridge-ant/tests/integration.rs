//! Integration tests for mqtt-bridge-ant.

use std::sync::{Arc, Mutex};

use antbridge_common::sensor::{DeviceType, SensorFrame};
use antbridge_common::{decode_frame, encode_frame};

use mqtt_bridge_ant::config::AntBridgeConfig;
use mqtt_bridge_ant::control::{self, Command, ControlListener};
use mqtt_bridge_ant::driver::{FrameSink, SimDriver};
use mqtt_bridge_ant::publisher::{MessageSink, PublishError, run_publish_pump};
use mqtt_bridge_ant::runtime::{Bridge, BridgeState};

/// In-memory sink standing in for the broker.
#[derive(Clone, Default)]
struct RecordingSink {
    published: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSink {
    fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), PublishError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

/// A simulated heart-rate frame must come out of the data path as exactly
/// one publish with the canonical wire payload.
#[tokio::test]
async fn test_frame_to_publish_end_to_end() {
    let (sink, rx) = FrameSink::channel(8);
    let recording = RecordingSink::default();

    sink.deliver(
        DeviceType::HeartRate,
        SensorFrame::from([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]),
    );
    drop(sink);

    run_publish_pump(
        rx,
        recording.clone(),
        "org.teamtibco.bikesensor.rawdata".to_string(),
    )
    .await;

    let published = recording.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "org.teamtibco.bikesensor.rawdata");
    assert_eq!(
        published[0].1,
        r#"{"deviceType":120,"message":"0102030405060708"}"#
    );
}

/// The published payload must round-trip back to the original frame bytes
/// through the common codec.
#[tokio::test]
async fn test_published_payload_round_trips() {
    let bytes = [0x00, 0x1a, 0x00, 0x00, 0x42, 0x00, 0x00, 0xff];
    let encoded = encode_frame(DeviceType::Power, &bytes).unwrap();

    let message = decode_frame(encoded.as_bytes()).unwrap();
    assert_eq!(message.device_type, 11);
    assert_eq!(message.message.len(), 16);
    assert_eq!(message.frame().unwrap().as_bytes(), &bytes);
}

/// A restart observed mid-`Running` walks the bridge through
/// `Running → Stopping → Starting → Running` and leaves exactly the original
/// four channels open.
#[tokio::test]
async fn test_restart_walk_with_sim_driver() {
    let config = AntBridgeConfig::parse("{}").unwrap();
    let (sink, _rx) = FrameSink::channel(64);
    let mut bridge = Bridge::new(SimDriver, config.ant, sink);

    assert_eq!(bridge.state(), BridgeState::Stopped);

    bridge.start().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Running);
    assert_eq!(bridge.open_devices().len(), 4);

    bridge.restart().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Running);

    let mut devices = bridge.open_devices();
    devices.sort();
    devices.dedup();
    assert_eq!(devices.len(), 4);

    bridge.shutdown();
    assert_eq!(bridge.state(), BridgeState::Stopped);
    assert!(bridge.open_devices().is_empty());
}

/// The simulated driver actually delivers frames that encode to valid wire
/// payloads.
#[tokio::test]
async fn test_sim_driver_frames_reach_the_sink() {
    let config = AntBridgeConfig::parse("{}").unwrap();
    let (sink, mut rx) = FrameSink::channel(64);
    let mut bridge = Bridge::new(SimDriver, config.ant, sink);

    bridge.start().await.unwrap();

    let received = rx.recv().await.expect("a simulated frame");
    let encoded = encode_frame(received.device_type, received.frame.as_bytes()).unwrap();
    let message = decode_frame(encoded.as_bytes()).unwrap();
    assert_eq!(message.message.len(), 16);

    bridge.shutdown();
}

/// An unrecognized control command is reported but produces no dispatch,
/// leaving the running bridge untouched.
#[tokio::test]
async fn test_unrecognized_command_leaves_bridge_running() {
    let config = AntBridgeConfig::parse("{}").unwrap();
    let (sink, _rx) = FrameSink::channel(64);
    let mut bridge = Bridge::new(SimDriver, config.ant, sink);
    bridge.start().await.unwrap();

    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::channel(4);
    let listener = ControlListener::new(config.control.topic.clone(), cmd_tx);

    listener
        .handle_message(&config.control.topic, br#"{"command":"shutdown"}"#)
        .await;

    assert!(cmd_rx.try_recv().is_err(), "nothing dispatched");
    assert_eq!(bridge.state(), BridgeState::Running);
    assert_eq!(bridge.open_devices().len(), 4);

    // A recognized command does dispatch and drives the restart.
    listener
        .handle_message(&config.control.topic, br#"{"command":"restart"}"#)
        .await;
    assert_eq!(cmd_rx.try_recv().unwrap(), Command::Restart);

    bridge.restart().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Running);
    assert_eq!(bridge.open_devices().len(), 4);

    bridge.shutdown();
}

/// Malformed control payloads parse to errors, never panics.
#[test]
fn test_control_parse_failures_are_typed() {
    assert!(control::parse_command(br#"{"command":"restart"}"#).is_ok());
    assert!(control::parse_command(b"\xff\xfe").is_err());
    assert!(control::parse_command(br#"{"command":"reboot"}"#).is_err());
}
