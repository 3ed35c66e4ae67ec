//! MQTT session setup.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use thiserror::Error;
use tracing::info;

use antbridge_common::config::MqttConfig;

/// Errors establishing the broker session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broker unreachable: {0}")]
    Broker(String),
}

/// Build the MQTT client for a broker config and confirm the initial
/// connection.
///
/// The event loop is driven to its first event so an unreachable broker
/// fails startup instead of retrying forever in the background.
pub async fn connect(config: &MqttConfig) -> Result<(AsyncClient, EventLoop), ConnectError> {
    let mut options = MqttOptions::new(
        config.client_id.as_str(),
        config.host.as_str(),
        config.port,
    );
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.as_str(), password.as_str());
    }

    let (client, mut eventloop) = AsyncClient::new(options, 64);

    match eventloop.poll().await {
        Ok(_) => {
            info!(host = %config.host, port = config.port, client_id = %config.client_id, "Connected to MQTT broker");
        }
        Err(e) => {
            return Err(ConnectError::Broker(e.to_string()));
        }
    }

    Ok((client, eventloop))
}
