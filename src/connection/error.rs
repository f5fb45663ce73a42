//! Transport errors

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure opening or using a connection. Every variant ends up as a
/// closure from the lifecycle's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("connection closed")]
    Closed,

    #[error("websocket error: {0}")]
    WebSocket(String),
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Closed
            }
            other => TransportError::WebSocket(other.to_string()),
        }
    }
}
