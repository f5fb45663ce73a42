//! Outbound frames

use serde::{Deserialize, Serialize};

/// The single frame the client sends: one user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: String,
}

impl OutboundFrame {
    pub fn user_message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
        }
    }

    /// Serialize for a WebSocket text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
