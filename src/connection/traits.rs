//! Trait abstractions for transport I/O
//!
//! The session runtime only talks to these traits, so tests can drive it
//! with in-memory connections.

use super::TransportError;
use crate::session::SessionId;
use async_trait::async_trait;
use std::sync::Arc;

/// One data frame as it came off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Opens connections to the chat endpoint of a session
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one bidirectional connection
    async fn connect(&self, session_id: &SessionId) -> Result<Box<dyn Connection>, TransportError>;
}

/// A live bidirectional message connection
#[async_trait]
pub trait Connection: Send {
    /// Transmit one text frame
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Next data frame. `None` once the peer has closed the connection.
    async fn recv(&mut self) -> Option<Result<RawFrame, TransportError>>;

    /// Close the connection; errors are not interesting at this point
    async fn close(&mut self);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Connector + ?Sized> Connector for Arc<T> {
    async fn connect(&self, session_id: &SessionId) -> Result<Box<dyn Connection>, TransportError> {
        (**self).connect(session_id).await
    }
}
