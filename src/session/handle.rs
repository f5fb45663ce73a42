//! Presentation-facing handle to a running session

use super::runtime::Command;
use super::SessionId;
use crate::protocol::FileDescriptor;
use crate::transcript::Transcript;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Read-only view of a session at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub transcript: Transcript,
    pub connected: bool,
    /// A reply is outstanding
    pub busy: bool,
    /// Files attached to this session, oldest first
    pub files: Vec<FileDescriptor>,
}

impl SessionSnapshot {
    pub(crate) fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            transcript: Transcript::new(),
            connected: false,
            busy: false,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session runtime has stopped")]
    Closed,
}

/// Cheap to clone; every clone talks to the same runtime task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: SessionId,
        command_tx: mpsc::Sender<Command>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            command_tx,
            snapshot_rx,
            shutdown,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Current state of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Observe every published state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Send a user message. Refusals (disconnected, empty text) are reported
    /// to the diagnostic sink and leave the transcript untouched.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(Command::Send { text: text.into() }).await
    }

    /// Clear the transcript; the connection is left alone
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.dispatch(Command::Reset).await
    }

    /// Record a file the upload endpoint accepted for this session
    pub async fn attach_file(&self, file: FileDescriptor) -> Result<(), SessionError> {
        self.dispatch(Command::AttachFile(file)).await
    }

    /// Tear the session down. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.command_tx.is_closed()
    }

    async fn dispatch(&self, command: Command) -> Result<(), SessionError> {
        if self.shutdown.is_cancelled() {
            return Err(SessionError::Closed);
        }
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
