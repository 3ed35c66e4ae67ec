//! Radio driver seam and frame delivery.
//!
//! The ANT radio protocol itself lives behind [`AntDriver`]; the bridge only
//! registers channels and receives frames pushed from the driver's own
//! receive context through a [`FrameSink`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use antbridge_common::sensor::{DeviceType, SensorFrame};

use crate::config::SensorSpec;

/// The ANT+ network key shared by all ANT+ device profiles.
pub const ANT_PLUS_NETWORK_KEY: [u8; 8] = [0xb9, 0xa5, 0x21, 0xfb, 0xbd, 0x72, 0xc3, 0x45];

/// ANT channel periods are expressed in counts of 1/32768 s.
const PERIOD_HZ: f64 = 32768.0;

/// Errors from the radio layer.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No device matching the spec was found within the search timeout.
    #[error("search for {device_type} device timed out after {timeout_secs}s")]
    SearchTimeout {
        device_type: DeviceType,
        timeout_secs: u32,
    },

    /// Radio hardware or protocol failure.
    #[error("radio error: {0}")]
    Radio(String),
}

/// A frame received on one channel.
///
/// Broadcast and burst transfers are treated identically.
#[derive(Debug, Clone, Copy)]
pub struct ReceivedFrame {
    pub device_type: DeviceType,
    pub frame: SensorFrame,
}

/// Cloneable handle a driver uses to push frames toward the publisher.
#[derive(Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<ReceivedFrame>,
}

impl FrameSink {
    /// Create a sink and the receiver end the publish pump drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReceivedFrame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Deliver one frame. Safe to call from any thread or task.
    ///
    /// Never blocks the radio receive context: when the pump has fallen
    /// behind or shut down, the frame is dropped with a log line.
    pub fn deliver(&self, device_type: DeviceType, frame: SensorFrame) {
        match self.tx.try_send(ReceivedFrame { device_type, frame }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(device = %device_type, "Frame channel full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(device = %device_type, "Frame channel closed, dropping frame");
            }
        }
    }
}

/// Driver abstraction over the ANT radio node.
///
/// Hardware radio libraries integrate by implementing this trait; the bridge
/// itself never speaks the radio protocol.
pub trait AntDriver: Send + Sync + 'static {
    /// Bring up the radio node with the given network key.
    fn start(&self, network_key: &[u8; 8]) -> Result<(), ChannelError>;

    /// Open one receive channel for the spec, delivering frames to `sink`.
    ///
    /// Resolves once a matching device is found, or fails with
    /// [`ChannelError::SearchTimeout`] after the spec's search timeout.
    fn open_channel(
        &self,
        spec: &SensorSpec,
        sink: FrameSink,
    ) -> impl Future<Output = Result<Box<dyn DriverChannel>, ChannelError>> + Send;

    /// Shut the radio node down.
    fn stop(&self);
}

/// An open radio channel. Dropping the handle must release the binding.
pub trait DriverChannel: Send {
    /// Close the channel and stop frame delivery.
    fn close(&mut self);
}

/// Simulated radio driver emitting synthetic frames at each sensor's
/// broadcast period.
///
/// Backs the shipped binary so the bridge can run without radio hardware;
/// real radios implement [`AntDriver`] instead.
#[derive(Debug, Default)]
pub struct SimDriver;

impl AntDriver for SimDriver {
    fn start(&self, _network_key: &[u8; 8]) -> Result<(), ChannelError> {
        info!("Simulated radio node started");
        Ok(())
    }

    async fn open_channel(
        &self,
        spec: &SensorSpec,
        sink: FrameSink,
    ) -> Result<Box<dyn DriverChannel>, ChannelError> {
        let device_type = spec.device_type;
        let period = Duration::from_secs_f64(spec.period as f64 / PERIOD_HZ);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut counter: u8 = 0;
            loop {
                ticker.tick().await;
                let frame = SensorFrame::from([
                    counter,
                    device_type.as_u8(),
                    0,
                    0,
                    0,
                    0,
                    0,
                    counter.wrapping_add(1),
                ]);
                sink.deliver(device_type, frame);
                counter = counter.wrapping_add(1);
            }
        });

        debug!(device = %device_type, period_ms = period.as_millis() as u64, "Simulated channel open");
        Ok(Box::new(SimChannel { device_type, task }))
    }

    fn stop(&self) {
        info!("Simulated radio node stopped");
    }
}

struct SimChannel {
    device_type: DeviceType,
    task: JoinHandle<()>,
}

impl DriverChannel for SimChannel {
    fn close(&mut self) {
        self.task.abort();
        debug!(device = %self.device_type, "Simulated channel closed");
    }
}

impl Drop for SimChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}
