//! A single sensor channel bound to the radio driver.

use tracing::debug;

use antbridge_common::sensor::DeviceType;

use crate::config::SensorSpec;
use crate::driver::{AntDriver, ChannelError, DriverChannel, FrameSink};

/// One logical ANT broadcast channel: a spec plus, when open, the driver
/// binding delivering its frames.
pub struct SensorChannel {
    spec: SensorSpec,
    handle: Option<Box<dyn DriverChannel>>,
}

impl SensorChannel {
    /// Create a closed channel for the spec.
    pub fn new(spec: SensorSpec) -> Self {
        Self { spec, handle: None }
    }

    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    pub fn device_type(&self) -> DeviceType {
        self.spec.device_type
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Open the channel against the driver. No-op when already open.
    pub async fn open<D: AntDriver>(
        &mut self,
        driver: &D,
        sink: &FrameSink,
    ) -> Result<(), ChannelError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = driver.open_channel(&self.spec, sink.clone()).await?;
        debug!(
            device = %self.spec.device_type,
            period = self.spec.period,
            rf_frequency = self.spec.rf_frequency,
            "Channel open"
        );
        self.handle = Some(handle);
        Ok(())
    }

    /// Close the channel. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
            debug!(device = %self.spec.device_type, "Channel closed");
        }
    }
}
