//! Wire codec for raw sensor frames.
//!
//! Every frame crosses the broker as one JSON object:
//! `{"deviceType": <int>, "message": "<16 lowercase hex chars>"}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensor::{DeviceType, FRAME_LEN, SensorFrame};

/// Errors from encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload was not exactly [`FRAME_LEN`] bytes.
    #[error("invalid frame length: expected {FRAME_LEN} bytes, got {len}")]
    InvalidFrameLength { len: usize },

    /// The `message` field was not valid hex.
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The published wire message: device type tag plus the frame bytes as
/// lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSensorMessage {
    /// ANT+ device type identifier.
    #[serde(rename = "deviceType")]
    pub device_type: u8,

    /// 16 lowercase hex characters, two per frame byte.
    pub message: String,
}

impl RawSensorMessage {
    /// Build a wire message from a frame.
    pub fn new(device_type: DeviceType, frame: &SensorFrame) -> Self {
        Self {
            device_type: device_type.as_u8(),
            message: frame.to_hex(),
        }
    }

    /// Recover the original frame bytes from the hex field.
    pub fn frame(&self) -> Result<SensorFrame, CodecError> {
        let bytes = hex::decode(&self.message)?;
        SensorFrame::from_slice(&bytes)
    }
}

/// Encode a raw frame into the canonical wire JSON string.
///
/// Pure: identical input always yields a byte-identical output string.
pub fn encode_frame(device_type: DeviceType, bytes: &[u8]) -> Result<String, CodecError> {
    let frame = SensorFrame::from_slice(bytes)?;
    let message = RawSensorMessage::new(device_type, &frame);
    Ok(serde_json::to_string(&message)?)
}

/// Decode a wire JSON payload back into its message form.
pub fn decode_frame(data: &[u8]) -> Result<RawSensorMessage, CodecError> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_exact_wire_format() {
        let encoded = encode_frame(DeviceType::HeartRate, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(
            encoded,
            r#"{"deviceType":120,"message":"0102030405060708"}"#
        );
    }

    #[test]
    fn test_encode_zero_pads_every_byte() {
        let encoded = encode_frame(
            DeviceType::Cadence,
            &[0x00, 0x1a, 0x00, 0x02, 0x00, 0x00, 0x00, 0xff],
        )
        .unwrap();
        let message: RawSensorMessage = serde_json::from_str(&encoded).unwrap();

        assert_eq!(message.message, "001a0002000000ff");
        assert_eq!(message.message.len(), 16);
        assert!(message.message.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(message.message, message.message.to_lowercase());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let bytes = [0xb9, 0xa5, 0x21, 0xfb, 0xbd, 0x72, 0xc3, 0x45];
        let first = encode_frame(DeviceType::Power, &bytes).unwrap();
        let second = encode_frame(DeviceType::Power, &bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_rejects_short_and_long_frames() {
        assert!(matches!(
            encode_frame(DeviceType::Speed, &[1, 2, 3]),
            Err(CodecError::InvalidFrameLength { len: 3 })
        ));
        assert!(matches!(
            encode_frame(DeviceType::Speed, &[0; 12]),
            Err(CodecError::InvalidFrameLength { len: 12 })
        ));
    }

    #[test]
    fn test_message_roundtrips_to_original_bytes() {
        let bytes = [0x00, 0x1a, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let encoded = encode_frame(DeviceType::Speed, &bytes).unwrap();

        let decoded = decode_frame(encoded.as_bytes()).unwrap();
        assert_eq!(decoded.device_type, 123);
        assert_eq!(decoded.frame().unwrap().as_bytes(), &bytes);
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(matches!(
            decode_frame(b"not json"),
            Err(CodecError::Json(_))
        ));
    }
}
