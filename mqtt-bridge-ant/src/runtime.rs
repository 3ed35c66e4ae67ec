//! Bridge lifecycle and the restart state machine.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use antbridge_common::sensor::DeviceType;

use crate::config::{AntBridgeConfig, AntConfig};
use crate::control::{Command, ControlListener};
use crate::driver::{AntDriver, ChannelError, FrameSink};
use crate::publisher::{MqttSink, run_publish_pump};
use crate::registry::ChannelRegistry;
use crate::session::{self, ConnectError};
use crate::status::BridgeStatus;

/// Name used in logs and status messages.
const BRIDGE_NAME: &str = "ant";

/// Capacity of the frame channel between the radio side and the publisher.
const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle states of the bridge.
///
/// A `restart` command drives `Running → Stopping → Starting → Running`;
/// an interrupt or fatal error drives `Running → Stopping → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl BridgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Stopped => "stopped",
            BridgeState::Starting => "starting",
            BridgeState::Running => "running",
            BridgeState::Stopping => "stopping",
        }
    }
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that stop the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("broker connection failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("channel open failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("control subscription failed: {0}")]
    Subscribe(String),
}

/// The sensor side of the bridge: radio driver, channel registry and state.
///
/// Owned by the runtime task. Frame delivery crosses the [`FrameSink`] seam,
/// so teardown and rebuild never race the radio receive context: a frame
/// arriving mid-rebuild is queued in the channel or dropped, never touching
/// half-torn-down channel state.
pub struct Bridge<D: AntDriver> {
    driver: D,
    config: AntConfig,
    sink: FrameSink,
    registry: ChannelRegistry,
    state: BridgeState,
}

impl<D: AntDriver> Bridge<D> {
    pub fn new(driver: D, config: AntConfig, sink: FrameSink) -> Self {
        let registry = ChannelRegistry::new(&config.sensors);
        Self {
            driver,
            config,
            sink,
            registry,
            state: BridgeState::Stopped,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Device types whose channels are currently open.
    pub fn open_devices(&self) -> Vec<DeviceType> {
        self.registry.open_devices()
    }

    /// Start the radio node and open all configured channels.
    pub async fn start(&mut self) -> Result<(), ChannelError> {
        self.transition(BridgeState::Starting);

        let key: [u8; 8] = self.config.network_key.as_slice().try_into().map_err(|_| {
            ChannelError::Radio(format!(
                "network key must be 8 bytes, got {}",
                self.config.network_key.len()
            ))
        })?;

        self.driver.start(&key)?;
        self.registry
            .open_all(&self.driver, &self.sink, self.config.open_policy)
            .await?;

        self.transition(BridgeState::Running);
        Ok(())
    }

    /// Tear down and rebuild the full channel set.
    ///
    /// Prior driver bindings are fully released before any reopen. Commands
    /// arriving while this runs queue behind it on the command channel, so
    /// restarts never interleave.
    pub async fn restart(&mut self) -> Result<(), ChannelError> {
        if self.state != BridgeState::Running {
            warn!(state = %self.state, "Ignoring restart while not running");
            return Ok(());
        }

        info!("Restarting sensor channels");
        self.transition(BridgeState::Stopping);
        self.registry.close_all();
        self.driver.stop();
        self.registry = ChannelRegistry::new(&self.config.sensors);
        self.start().await
    }

    /// Close all channels and stop the radio node. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == BridgeState::Stopped {
            return;
        }
        self.transition(BridgeState::Stopping);
        self.registry.close_all();
        self.driver.stop();
        self.transition(BridgeState::Stopped);
    }

    fn transition(&mut self, next: BridgeState) {
        info!(from = %self.state, to = %next, "Bridge state change");
        self.state = next;
    }
}

/// Run the bridge until interrupted.
///
/// Wires the broker session(s), publish pump, control listener and the
/// sensor bridge, then services control commands until Ctrl+C.
pub async fn run<D: AntDriver>(config: AntBridgeConfig, driver: D) -> Result<(), BridgeError> {
    let version = env!("CARGO_PKG_VERSION");

    let (client, eventloop) = session::connect(&config.mqtt).await?;

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(8);
    let listener = ControlListener::new(config.control.topic.clone(), cmd_tx);

    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    // Control commands arrive on a dedicated broker session when one is
    // configured, otherwise on the data session.
    let control_client = match &config.control.mqtt {
        Some(control_mqtt) => {
            let (control_client, control_eventloop) = session::connect(control_mqtt).await?;
            subscribe(&control_client, listener.topic()).await?;
            tasks.push(tokio::spawn(drive_event_loop(
                control_client.clone(),
                control_eventloop,
                Some(listener),
            )));
            tasks.push(tokio::spawn(drive_event_loop(
                client.clone(),
                eventloop,
                None,
            )));
            Some(control_client)
        }
        None => {
            subscribe(&client, listener.topic()).await?;
            tasks.push(tokio::spawn(drive_event_loop(
                client.clone(),
                eventloop,
                Some(listener),
            )));
            None
        }
    };

    // Frame path: driver receive contexts → sink → pump → data topic.
    let (sink, frame_rx) = FrameSink::channel(FRAME_CHANNEL_CAPACITY);
    tasks.push(tokio::spawn(run_publish_pump(
        frame_rx,
        MqttSink::new(client.clone()),
        config.ant.data_topic.clone(),
    )));

    // Status rides on the control session when one is present.
    let status_sink = MqttSink::new(control_client.clone().unwrap_or_else(|| client.clone()));
    let status_topic = config.ant.status_topic.clone();

    let mut bridge = Bridge::new(driver, config.ant, sink);

    if let Err(e) = bridge.start().await {
        error!(error = %e, "Bridge startup failed");
        bridge.shutdown();
        BridgeStatus::error(BRIDGE_NAME, version, e.to_string())
            .publish(&status_sink, &status_topic)
            .await;
        flush_and_stop(&tasks, &client, control_client.as_ref()).await;
        return Err(e.into());
    }

    BridgeStatus::running(BRIDGE_NAME, version)
        .with_metadata(open_devices_metadata(&bridge))
        .publish(&status_sink, &status_topic)
        .await;

    info!("Bridge running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            command = cmd_rx.recv() => match command {
                Some(Command::Restart) => {
                    if let Err(e) = bridge.restart().await {
                        error!(error = %e, "Restart failed");
                        break;
                    }
                    BridgeStatus::running(BRIDGE_NAME, version)
                        .with_metadata(open_devices_metadata(&bridge))
                        .publish(&status_sink, &status_topic)
                        .await;
                }
                None => break,
            },
        }
    }

    bridge.shutdown();
    BridgeStatus::offline(BRIDGE_NAME, version)
        .publish(&status_sink, &status_topic)
        .await;
    flush_and_stop(&tasks, &client, control_client.as_ref()).await;

    info!("Goodbye!");
    Ok(())
}

async fn subscribe(client: &AsyncClient, topic: &str) -> Result<(), BridgeError> {
    client
        .subscribe(topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| BridgeError::Subscribe(e.to_string()))
}

/// Drive one MQTT event loop: keeps the client progressing, re-subscribes
/// after reconnects and feeds inbound control messages to the listener.
async fn drive_event_loop(
    client: AsyncClient,
    mut eventloop: EventLoop,
    listener: Option<ControlListener>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                // Subscriptions do not survive a reconnect; re-issue ours.
                if let Some(ref listener) = listener {
                    if let Err(e) = client.subscribe(listener.topic(), QoS::AtLeastOnce).await {
                        warn!(error = %e, "Control re-subscribe failed");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if let Some(ref listener) = listener {
                    listener
                        .handle_message(&publish.topic, &publish.payload)
                        .await;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "MQTT connection lost, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Ordered teardown of the broker side: disconnect while the event-loop
/// tasks are still polling so the final messages leave, then abort.
async fn flush_and_stop(
    tasks: &[JoinHandle<()>],
    client: &AsyncClient,
    control_client: Option<&AsyncClient>,
) {
    let _ = client.disconnect().await;
    if let Some(control) = control_client {
        let _ = control.disconnect().await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    for task in tasks {
        task.abort();
    }
}

fn open_devices_metadata<D: AntDriver>(bridge: &Bridge<D>) -> serde_json::Value {
    serde_json::json!({
        "open_devices": bridge
            .open_devices()
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>(),
    })
}
