//! ANT+ Bridge Common Library
//!
//! This crate provides shared types and utilities for the ANT+ sensor MQTT
//! bridge:
//!
//! - [`sensor`] - Sensor data model (`DeviceType`, `SensorFrame`)
//! - [`codec`] - Wire codec for raw frames (JSON + lowercase hex)
//! - [`topic`] - MQTT topic names
//! - [`config`] - Configuration primitives and JSON5 loading
//! - [`error`] - Error types

pub mod codec;
pub mod config;
pub mod error;
pub mod sensor;
pub mod topic;

// Re-export commonly used types at the crate root
pub use codec::{CodecError, RawSensorMessage, decode_frame, encode_frame};
pub use config::{LogFormat, LoggingConfig, MqttConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use sensor::{DeviceType, FRAME_LEN, SensorFrame, UnknownDeviceType};
pub use topic::{CONTROL_TOPIC, DATA_TOPIC, STATUS_TOPIC};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// # Example
///
/// ```ignore
/// use antbridge_common::{LogFormat, LoggingConfig, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
