use serde::{Deserialize, Serialize};

use crate::codec::CodecError;

/// Length in bytes of a single ANT+ broadcast or burst payload.
pub const FRAME_LEN: usize = 8;

/// ANT+ device type tags for the sensors this bridge monitors.
///
/// The numeric values are the ANT+ device type identifiers carried in the
/// channel ID and echoed in the published JSON for downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeviceType {
    HeartRate = 120,
    Cadence = 122,
    Speed = 123,
    Power = 11,
}

impl DeviceType {
    /// Every device type this bridge knows about.
    pub const ALL: [DeviceType; 4] = [
        DeviceType::HeartRate,
        DeviceType::Cadence,
        DeviceType::Speed,
        DeviceType::Power,
    ];

    /// Get the numeric ANT+ device type identifier.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Get the string representation used in logs and status metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::HeartRate => "heart_rate",
            DeviceType::Cadence => "cadence",
            DeviceType::Speed => "speed",
            DeviceType::Power => "power",
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(device_type: DeviceType) -> u8 {
        device_type as u8
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = UnknownDeviceType;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            120 => Ok(DeviceType::HeartRate),
            122 => Ok(DeviceType::Cadence),
            123 => Ok(DeviceType::Speed),
            11 => Ok(DeviceType::Power),
            other => Err(UnknownDeviceType(other)),
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an ANT+ device type value outside the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown ANT+ device type: {0}")]
pub struct UnknownDeviceType(pub u8);

/// One raw 8-byte sensor payload as delivered by a broadcast or burst
/// transfer.
///
/// The bridge treats the bytes as opaque; sensor-specific decoding happens
/// downstream of the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFrame([u8; FRAME_LEN]);

impl SensorFrame {
    /// Wrap a byte slice, failing unless it is exactly 8 bytes.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        let frame: [u8; FRAME_LEN] = bytes
            .try_into()
            .map_err(|_| CodecError::InvalidFrameLength { len: bytes.len() })?;
        Ok(Self(frame))
    }

    /// The raw frame bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, two digits per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; FRAME_LEN]> for SensorFrame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}
