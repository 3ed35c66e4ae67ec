//! Frame publishing to the MQTT broker.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use antbridge_common::codec;

use crate::driver::ReceivedFrame;

/// Errors from broker publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The client's request channel is gone (disconnected or shut down).
    #[error("not connected to broker")]
    NotConnected,

    /// Client-side failure handing the message to the transport.
    #[error("publish failed: {0}")]
    Client(String),
}

/// Sink for outbound wire messages.
///
/// The bridge publishes through this seam so the broker transport stays
/// swappable; [`MqttSink`] is the production implementation.
pub trait MessageSink: Send + Sync + 'static {
    /// Publish one payload to a topic, fire-and-forget.
    fn publish(
        &self,
        topic: &str,
        payload: String,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// MQTT-backed sink. QoS 0: no acknowledgement is awaited, matching the
/// fire-and-forget publishes of the frame path.
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
}

impl MqttSink {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl MessageSink for MqttSink {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), PublishError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|_| PublishError::NotConnected)
    }
}

/// Drain received frames, encode them and publish to the data topic.
///
/// Codec and publish failures are logged and skipped; one bad frame must
/// never take the delivery path down. Exits when the frame channel closes.
pub async fn run_publish_pump<S: MessageSink>(
    mut rx: mpsc::Receiver<ReceivedFrame>,
    sink: S,
    topic: String,
) {
    while let Some(received) = rx.recv().await {
        let payload = match codec::encode_frame(received.device_type, received.frame.as_bytes()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(device = %received.device_type, error = %e, "Failed to encode frame");
                continue;
            }
        };

        match sink.publish(&topic, payload).await {
            Ok(()) => {
                debug!(device = %received.device_type, topic = %topic, "Published frame");
            }
            Err(e) => {
                warn!(device = %received.device_type, error = %e, "Failed to publish frame");
            }
        }
    }

    debug!("Publish pump stopped");
}
