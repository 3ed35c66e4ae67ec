//! Remote control commands over MQTT.
//!
//! The bridge subscribes to a control topic; a `{"command": "restart"}`
//! message tears down and rebuilds the full sensor channel set. Anything
//! else on the topic is reported and ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Errors parsing an inbound control message.
#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("malformed control message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized command: {0:?}")]
    Unrecognized(String),
}

/// Wire schema of a control message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    pub command: String,
}

/// A recognized control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Tear down and rebuild the full sensor channel set.
    Restart,
}

/// Parse a raw control payload into a command.
pub fn parse_command(raw: &[u8]) -> Result<Command, CommandParseError> {
    let message: ControlMessage = serde_json::from_slice(raw)?;
    match message.command.as_str() {
        "restart" => Ok(Command::Restart),
        other => Err(CommandParseError::Unrecognized(other.to_string())),
    }
}

/// Dispatches inbound control payloads to the runtime's command channel.
pub struct ControlListener {
    topic: String,
    commands: mpsc::Sender<Command>,
}

impl ControlListener {
    pub fn new(topic: impl Into<String>, commands: mpsc::Sender<Command>) -> Self {
        Self {
            topic: topic.into(),
            commands,
        }
    }

    /// Topic this listener subscribes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Handle one inbound publish.
    ///
    /// Parse failures are reported, never propagated; the listener keeps
    /// running across malformed traffic.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) {
        if topic != self.topic {
            return;
        }

        match parse_command(payload) {
            Ok(command) => {
                info!(?command, "Control command received");
                if self.commands.send(command).await.is_err() {
                    warn!("Runtime command channel closed, dropping control command");
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring control message");
            }
        }
    }
}
