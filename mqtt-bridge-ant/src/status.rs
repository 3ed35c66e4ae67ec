//! Bridge status reporting.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::publisher::MessageSink;

/// Status message published on startup, after restarts, and on shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name.
    pub bridge: String,
    /// Bridge version.
    pub version: String,
    /// Current status ("running", "offline", "error").
    pub status: String,
    /// Additional metadata (e.g. the open device set).
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl BridgeStatus {
    /// Create a new status with "running" state.
    pub fn running(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: "running".to_string(),
            // Flattened metadata must stay a map for serialization.
            metadata: serde_json::json!({}),
        }
    }

    /// Create a status with "offline" state.
    pub fn offline(bridge: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: "offline".to_string(),
            metadata: serde_json::json!({}),
        }
    }

    /// Create a status with "error" state.
    pub fn error(
        bridge: impl Into<String>,
        version: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            bridge: bridge.into(),
            version: version.into(),
            status: "error".to_string(),
            metadata: serde_json::json!({ "error": error.into() }),
        }
    }

    /// Add metadata to the status.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Publish this status. Failures are logged, never fatal.
    pub async fn publish<S: MessageSink>(&self, sink: &S, topic: &str) {
        match serde_json::to_string(self) {
            Ok(payload) => {
                if let Err(e) = sink.publish(topic, payload).await {
                    warn!(error = %e, "Failed to publish bridge status");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize bridge status");
            }
        }
    }
}
