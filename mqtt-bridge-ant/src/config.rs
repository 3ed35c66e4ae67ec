//! Configuration for the ANT bridge.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use antbridge_common::config::{LoggingConfig, MqttConfig};
use antbridge_common::sensor::DeviceType;
use antbridge_common::topic;

use crate::driver::ANT_PLUS_NETWORK_KEY;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntBridgeConfig {
    /// Data broker connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Control channel settings.
    #[serde(default)]
    pub control: ControlConfig,

    /// ANT radio settings.
    #[serde(default)]
    pub ant: AntConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AntBridgeConfig {
    /// Load from a JSON5 file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse from a JSON5 string and validate.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ant.sensors.is_empty() {
            return Err(ConfigError::Validation(
                "at least one sensor must be configured".to_string(),
            ));
        }

        if self.ant.network_key.len() != 8 {
            return Err(ConfigError::Validation(format!(
                "network key must be 8 bytes, got {}",
                self.ant.network_key.len()
            )));
        }

        let mut seen: Vec<DeviceType> = Vec::new();
        for spec in &self.ant.sensors {
            if seen.contains(&spec.device_type) {
                return Err(ConfigError::Validation(format!(
                    "duplicate sensor entry for {}",
                    spec.device_type
                )));
            }
            seen.push(spec.device_type);
        }

        Ok(())
    }
}

impl Default for AntBridgeConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            control: ControlConfig::default(),
            ant: AntConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Control channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Separate (e.g. external) broker for control commands.
    ///
    /// When absent the control listener shares the data broker session.
    #[serde(default)]
    pub mqtt: Option<MqttConfig>,

    /// Topic to subscribe to for commands.
    #[serde(default = "default_control_topic")]
    pub topic: String,
}

fn default_control_topic() -> String {
    topic::CONTROL_TOPIC.to_string()
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mqtt: None,
            topic: default_control_topic(),
        }
    }
}

/// ANT radio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntConfig {
    /// 8-byte network key the radio node is brought up with.
    #[serde(default = "default_network_key")]
    pub network_key: Vec<u8>,

    /// What to do when a channel open fails.
    #[serde(default)]
    pub open_policy: OpenPolicy,

    /// Topic raw sensor frames are published to.
    #[serde(default = "default_data_topic")]
    pub data_topic: String,

    /// Topic bridge status is published to.
    #[serde(default = "default_status_topic")]
    pub status_topic: String,

    /// Sensors to monitor.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorSpec>,
}

fn default_network_key() -> Vec<u8> {
    ANT_PLUS_NETWORK_KEY.to_vec()
}

fn default_data_topic() -> String {
    topic::DATA_TOPIC.to_string()
}

fn default_status_topic() -> String {
    topic::STATUS_TOPIC.to_string()
}

impl Default for AntConfig {
    fn default() -> Self {
        Self {
            network_key: default_network_key(),
            open_policy: OpenPolicy::default(),
            data_topic: default_data_topic(),
            status_topic: default_status_topic(),
            sensors: default_sensors(),
        }
    }
}

/// Policy for handling per-channel open failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenPolicy {
    /// Log open failures and continue with the channels that did open.
    #[default]
    BestEffort,
    /// Abort startup or restart on the first open failure.
    FailFast,
}

/// Configuration for a single monitored sensor channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// ANT+ device type to search for.
    pub device_type: DeviceType,

    /// Channel period in 1/32768 s counts.
    pub period: u16,

    /// Search timeout before an open fails, in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u32,

    /// RF frequency offset from 2400 MHz.
    #[serde(default = "default_rf_frequency")]
    pub rf_frequency: u8,

    /// Device number to pair with; 0 matches any device.
    #[serde(default)]
    pub device_number: u16,
}

fn default_search_timeout_secs() -> u32 {
    30
}

fn default_rf_frequency() -> u8 {
    57
}

/// The four stock bike sensors with their standard ANT+ channel parameters.
pub fn default_sensors() -> Vec<SensorSpec> {
    vec![
        SensorSpec {
            device_type: DeviceType::HeartRate,
            period: 8070,
            search_timeout_secs: 12,
            rf_frequency: 57,
            device_number: 0,
        },
        SensorSpec {
            device_type: DeviceType::Cadence,
            period: 8102,
            search_timeout_secs: 30,
            rf_frequency: 57,
            device_number: 0,
        },
        SensorSpec {
            device_type: DeviceType::Speed,
            period: 8118,
            search_timeout_secs: 30,
            rf_frequency: 57,
            device_number: 0,
        },
        SensorSpec {
            device_type: DeviceType::Power,
            period: 8182,
            search_timeout_secs: 30,
            rf_frequency: 57,
            device_number: 0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_gets_stock_defaults() {
        let config = AntBridgeConfig::parse("{}").unwrap();

        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.control.topic, "org.teamtibco.antdevice.control");
        assert_eq!(config.ant.data_topic, "org.teamtibco.bikesensor.rawdata");
        assert_eq!(config.ant.network_key, ANT_PLUS_NETWORK_KEY.to_vec());
        assert_eq!(config.ant.open_policy, OpenPolicy::BestEffort);

        let device_types: Vec<DeviceType> =
            config.ant.sensors.iter().map(|s| s.device_type).collect();
        assert_eq!(
            device_types,
            vec![
                DeviceType::HeartRate,
                DeviceType::Cadence,
                DeviceType::Speed,
                DeviceType::Power
            ]
        );
    }

    #[test]
    fn test_stock_channel_parameters() {
        let sensors = default_sensors();

        let heart_rate = &sensors[0];
        assert_eq!(heart_rate.period, 8070);
        assert_eq!(heart_rate.search_timeout_secs, 12);
        assert_eq!(heart_rate.rf_frequency, 57);
        assert_eq!(heart_rate.device_number, 0);

        let power = &sensors[3];
        assert_eq!(power.period, 8182);
        assert_eq!(power.search_timeout_secs, 30);
    }

    #[test]
    fn test_parse_custom_sensor_list() {
        let json5 = r#"
        {
            ant: {
                open_policy: "fail-fast",
                sensors: [
                    { device_type: 120, period: 8070, search_timeout_secs: 12 },
                    { device_type: 11, period: 8182 },
                ],
            },
        }
        "#;

        let config = AntBridgeConfig::parse(json5).unwrap();

        assert_eq!(config.ant.open_policy, OpenPolicy::FailFast);
        assert_eq!(config.ant.sensors.len(), 2);
        assert_eq!(config.ant.sensors[0].device_type, DeviceType::HeartRate);
        assert_eq!(config.ant.sensors[1].device_type, DeviceType::Power);
        assert_eq!(config.ant.sensors[1].search_timeout_secs, 30);
        assert_eq!(config.ant.sensors[1].rf_frequency, 57);
    }

    #[test]
    fn test_separate_control_broker() {
        let json5 = r#"
        {
            control: {
                mqtt: {
                    host: "broker.example.org",
                    port: 8883,
                    username: "bridge",
                    password: "secret",
                },
            },
        }
        "#;

        let config = AntBridgeConfig::parse(json5).unwrap();
        let control = config.control.mqtt.expect("control broker configured");

        assert_eq!(control.host, "broker.example.org");
        assert_eq!(control.port, 8883);
        assert_eq!(control.username.as_deref(), Some("bridge"));
    }

    #[test]
    fn test_rejects_empty_sensor_list() {
        let result = AntBridgeConfig::parse(r#"{ ant: { sensors: [] } }"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_network_key_length() {
        let result =
            AntBridgeConfig::parse(r#"{ ant: { network_key: [0xb9, 0xa5, 0x21] } }"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_duplicate_device_types() {
        let json5 = r#"
        {
            ant: {
                sensors: [
                    { device_type: 120, period: 8070 },
                    { device_type: 120, period: 8070 },
                ],
            },
        }
        "#;

        let result = AntBridgeConfig::parse(json5);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_unknown_device_type() {
        let json5 = r#"
        {
            ant: {
                sensors: [
                    { device_type: 42, period: 8070 },
                ],
            },
        }
        "#;

        let result = AntBridgeConfig::parse(json5);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
