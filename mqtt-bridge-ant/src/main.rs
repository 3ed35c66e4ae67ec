//! MQTT bridge for ANT+ bike sensor broadcasts.
//!
//! Opens the configured sensor channels, publishes each raw frame to the
//! data topic as JSON-wrapped hex, and services restart commands from the
//! control topic.

use anyhow::Result;

use antbridge_common::{LoggingConfig, init_tracing};
use mqtt_bridge_ant::args::BridgeArgs;
use mqtt_bridge_ant::config::AntBridgeConfig;
use mqtt_bridge_ant::driver::SimDriver;
use mqtt_bridge_ant::runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse();

    let config = AntBridgeConfig::load(&args.config)?;

    let log_config = match args.log_level {
        Some(level) => LoggingConfig {
            level,
            format: config.logging.format,
        },
        None => config.logging.clone(),
    };
    init_tracing(&log_config)?;

    tracing::info!(
        sensors = config.ant.sensors.len(),
        data_topic = %config.ant.data_topic,
        control_topic = %config.control.topic,
        "Starting ANT bridge"
    );

    runtime::run(config, SimDriver).await?;

    Ok(())
}
