//! Diagnostic sink for recoverable faults
//!
//! Nothing reported here is fatal to the session; it is surfaced so an
//! operator can see why a frame vanished or a send did nothing.

use crate::connection::TransportError;
use crate::protocol::DecodeError;
use crate::transcript::TransitionError;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An inbound frame failed to decode and was dropped
    FrameDropped { error: DecodeError },
    /// A user send was refused and had no effect
    SendRefused { reason: TransitionError },
    /// A connection attempt failed
    ConnectFailed { attempt: u32, reason: TransportError },
    /// A live connection closed or errored
    ConnectionLost { reason: Option<TransportError> },
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, session_id: &str, diagnostic: Diagnostic);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn report(&self, session_id: &str, diagnostic: Diagnostic) {
        (**self).report(session_id, diagnostic);
    }
}

/// Writes diagnostics to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, session_id: &str, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::FrameDropped { error } => {
                tracing::warn!(session_id, error = %error, "Dropped undecodable frame");
            }
            Diagnostic::SendRefused { reason } => {
                tracing::info!(session_id, reason = %reason, "Send refused");
            }
            Diagnostic::ConnectFailed { attempt, reason } => {
                tracing::warn!(session_id, attempt, error = %reason, "Connection attempt failed");
            }
            Diagnostic::ConnectionLost { reason: Some(reason) } => {
                tracing::warn!(session_id, error = %reason, "Connection lost");
            }
            Diagnostic::ConnectionLost { reason: None } => {
                tracing::info!(session_id, "Connection closed by server");
            }
        }
    }
}
