//! Ownership and batch lifecycle of the configured sensor channels.

use tracing::{info, warn};

use antbridge_common::sensor::DeviceType;

use crate::channel::SensorChannel;
use crate::config::{OpenPolicy, SensorSpec};
use crate::driver::{AntDriver, ChannelError, FrameSink};

/// Per-channel outcome of an [`ChannelRegistry::open_all`] call.
#[derive(Debug, Default)]
pub struct OpenReport {
    /// Device types whose channels opened.
    pub opened: Vec<DeviceType>,
    /// Device types whose open failed, with the failure.
    pub failed: Vec<(DeviceType, ChannelError)>,
}

impl OpenReport {
    /// True when every configured channel opened.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the configured set of sensor channels and opens/closes them as a
/// batch.
///
/// Rebuilding for a restart is `close_all` followed by a fresh registry, so
/// prior driver bindings are fully released before any reopen.
pub struct ChannelRegistry {
    channels: Vec<SensorChannel>,
}

impl ChannelRegistry {
    /// Build one closed channel per spec.
    pub fn new(specs: &[SensorSpec]) -> Self {
        Self {
            channels: specs.iter().cloned().map(SensorChannel::new).collect(),
        }
    }

    /// Open every channel, applying the configured failure policy.
    ///
    /// Under `BestEffort` failures are logged and collected in the report;
    /// under `FailFast` the first failure closes whatever already opened and
    /// propagates.
    pub async fn open_all<D: AntDriver>(
        &mut self,
        driver: &D,
        sink: &FrameSink,
        policy: OpenPolicy,
    ) -> Result<OpenReport, ChannelError> {
        let mut report = OpenReport::default();

        for index in 0..self.channels.len() {
            let device_type = self.channels[index].device_type();
            match self.channels[index].open(driver, sink).await {
                Ok(()) => report.opened.push(device_type),
                Err(e) => match policy {
                    OpenPolicy::BestEffort => {
                        warn!(device = %device_type, error = %e, "Channel open failed, continuing");
                        report.failed.push((device_type, e));
                    }
                    OpenPolicy::FailFast => {
                        self.close_all();
                        return Err(e);
                    }
                },
            }
        }

        if report.is_complete() {
            info!(channels = report.opened.len(), "All channels open");
        } else {
            warn!(
                open = report.opened.len(),
                failed = report.failed.len(),
                "Running with a degraded channel set"
            );
        }

        Ok(report)
    }

    /// Close every open channel. Idempotent.
    pub fn close_all(&mut self) {
        for channel in &mut self.channels {
            channel.close();
        }
    }

    /// Device types currently open.
    pub fn open_devices(&self) -> Vec<DeviceType> {
        self.channels
            .iter()
            .filter(|c| c.is_open())
            .map(|c| c.device_type())
            .collect()
    }

    /// Number of open channels.
    pub fn open_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_open()).count()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
