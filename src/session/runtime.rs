//! Session runtime
//!
//! One task per session owns the assembler, the link state, the live
//! connection and the retry timer, and handles one input at a time.

use super::diagnostics::{Diagnostic, DiagnosticSink};
use super::handle::{SessionHandle, SessionSnapshot};
use super::SessionId;
use crate::connection::{
    self, Connection, Connector, LinkEffect, LinkEvent, LinkState, RawFrame, ReconnectPolicy,
    TransportError,
};
use crate::protocol::{classify, classify_bytes, FileDescriptor, OutboundFrame};
use crate::transcript::{Assembler, AssemblyContext, Event};
use futures::future::BoxFuture;
use std::future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Requests from the handle to the runtime task
#[derive(Debug)]
pub(crate) enum Command {
    Send { text: String },
    Reset,
    AttachFile(FileDescriptor),
}

/// Tunables for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub reconnect: ReconnectPolicy,
    /// Bound of the handle-to-runtime command queue
    pub command_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            command_capacity: 64,
        }
    }
}

type PendingConnect = BoxFuture<'static, Result<Box<dyn Connection>, TransportError>>;

pub struct SessionRuntime<C: Connector, D: DiagnosticSink> {
    session_id: SessionId,
    connector: Arc<C>,
    diagnostics: D,
    policy: ReconnectPolicy,
    link: LinkState,
    assembler: Assembler,
    files: Vec<FileDescriptor>,
    connection: Option<Box<dyn Connection>>,
    pending_connect: Option<PendingConnect>,
    retry_at: Option<Instant>,
    command_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    shutdown: CancellationToken,
}

impl<C, D> SessionRuntime<C, D>
where
    C: Connector + 'static,
    D: DiagnosticSink + 'static,
{
    /// Start a session task. It connects immediately and keeps reconnecting
    /// until [`SessionHandle::shutdown`] is called or every handle is dropped.
    pub fn spawn(
        session_id: SessionId,
        connector: C,
        diagnostics: D,
        options: SessionOptions,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(options.command_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::empty(session_id.clone()));
        let shutdown = CancellationToken::new();

        let runtime = Self {
            session_id: session_id.clone(),
            connector: Arc::new(connector),
            diagnostics,
            policy: options.reconnect,
            link: LinkState::default(),
            assembler: Assembler::new(),
            files: Vec::new(),
            connection: None,
            pending_connect: None,
            retry_at: None,
            command_rx,
            snapshot_tx,
            shutdown: shutdown.clone(),
        };

        let handle = SessionHandle::new(session_id, command_tx, snapshot_rx, shutdown);
        let task = tokio::spawn(runtime.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        self.drive_link(LinkEvent::ConnectRequested).await;

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        tracing::debug!(session_id = %self.session_id, "All handles dropped");
                        break;
                    }
                },

                result = next_connect(&mut self.pending_connect) => {
                    self.pending_connect = None;
                    self.on_connect_result(result).await;
                }

                () = retry_elapsed(self.retry_at) => {
                    self.retry_at = None;
                    self.drive_link(LinkEvent::RetryElapsed).await;
                }

                frame = next_frame(&mut self.connection) => self.on_frame(frame).await,
            }
        }

        self.drive_link(LinkEvent::Shutdown).await;
        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send { text } => self.send(text).await,

            Command::Reset => {
                let ctx = self.context();
                if let Err(e) = self.assembler.handle(&ctx, Event::Reset) {
                    tracing::error!(session_id = %self.session_id, error = %e, "Reset refused");
                }
                tracing::info!(session_id = %self.session_id, "Transcript reset");
                self.publish();
            }

            Command::AttachFile(file) => {
                tracing::info!(
                    session_id = %self.session_id,
                    file_id = %file.file_id,
                    filename = %file.filename,
                    "File attached"
                );
                if let Some(existing) = self.files.iter_mut().find(|f| f.file_id == file.file_id) {
                    *existing = file;
                } else {
                    self.files.push(file);
                }
                self.publish();
            }
        }
    }

    async fn send(&mut self, text: String) {
        let ctx = self.context();
        match self.assembler.handle(&ctx, Event::UserSend { text }) {
            Ok(outbound) => {
                // The echo is visible before the frame leaves
                self.publish();
                for frame in outbound {
                    self.transmit(&frame).await;
                }
            }
            Err(reason) => self.report(Diagnostic::SendRefused { reason }),
        }
    }

    async fn transmit(&mut self, frame: &OutboundFrame) {
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Failed to encode outbound frame");
                return;
            }
        };

        let Some(connection) = self.connection.as_mut() else {
            tracing::warn!(session_id = %self.session_id, "No connection for outbound frame");
            return;
        };

        if let Err(reason) = connection.send_text(text).await {
            self.connection_lost(Some(reason)).await;
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    async fn on_connect_result(&mut self, result: Result<Box<dyn Connection>, TransportError>) {
        match result {
            Ok(connection) => {
                self.connection = Some(connection);
                self.drive_link(LinkEvent::Opened).await;
            }
            Err(reason) => {
                let attempt = match self.link {
                    LinkState::Connecting { attempt } => attempt,
                    _ => 0,
                };
                self.report(Diagnostic::ConnectFailed { attempt, reason });
                self.abandon_reply();
                self.drive_link(LinkEvent::Closed).await;
            }
        }
    }

    async fn on_frame(&mut self, frame: Option<Result<RawFrame, TransportError>>) {
        let raw = match frame {
            Some(Ok(raw)) => raw,
            Some(Err(reason)) => return self.connection_lost(Some(reason)).await,
            None => return self.connection_lost(None).await,
        };

        let decoded = match &raw {
            RawFrame::Text(text) => classify(text),
            RawFrame::Binary(bytes) => classify_bytes(bytes),
        };

        match decoded {
            Ok(frame) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    frame_type = frame.frame_type(),
                    "Frame received"
                );
                let terminal = frame.is_terminal();
                let ctx = self.context();
                self.assembler.handle_frame(&ctx, frame);
                self.publish();
                if terminal {
                    tracing::info!(
                        session_id = %self.session_id,
                        turns = self.assembler.transcript().len(),
                        "Reply finished"
                    );
                }
            }
            Err(error) => self.report(Diagnostic::FrameDropped { error }),
        }
    }

    async fn connection_lost(&mut self, reason: Option<TransportError>) {
        self.report(Diagnostic::ConnectionLost { reason });
        self.connection = None;
        self.abandon_reply();
        self.drive_link(LinkEvent::Closed).await;
    }

    // Closing the link publishes the snapshot, so no publish here
    fn abandon_reply(&mut self) {
        let ctx = self.context();
        if let Err(e) = self.assembler.handle(&ctx, Event::ConnectionLost) {
            tracing::error!(session_id = %self.session_id, error = %e, "Abandoning reply refused");
        }
    }

    // ========================================================================
    // Link state machine
    // ========================================================================

    async fn drive_link(&mut self, event: LinkEvent) {
        let result = connection::transition(self.link, &self.policy, event);
        if result.new_state != self.link {
            tracing::debug!(
                session_id = %self.session_id,
                from = ?self.link,
                to = ?result.new_state,
                ?event,
                "Link transition"
            );
        }
        self.link = result.new_state;

        for effect in result.effects {
            self.execute_link_effect(effect).await;
        }
    }

    async fn execute_link_effect(&mut self, effect: LinkEffect) {
        match effect {
            LinkEffect::OpenConnection { attempt } => {
                tracing::info!(session_id = %self.session_id, attempt, "Connecting");
                let connector = Arc::clone(&self.connector);
                let session_id = self.session_id.clone();
                self.pending_connect =
                    Some(Box::pin(async move { connector.connect(&session_id).await }));
            }

            LinkEffect::ScheduleRetry { delay, attempt } => {
                tracing::info!(
                    session_id = %self.session_id,
                    attempt,
                    ?delay,
                    "Scheduling reconnect"
                );
                self.retry_at = Some(Instant::now() + delay);
            }

            LinkEffect::CancelRetry => self.retry_at = None,

            LinkEffect::CloseConnection => {
                self.pending_connect = None;
                if let Some(mut connection) = self.connection.take() {
                    connection.close().await;
                }
            }

            LinkEffect::PublishConnected(connected) => {
                tracing::info!(session_id = %self.session_id, connected, "Connection state changed");
                self.publish();
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn context(&self) -> AssemblyContext {
        AssemblyContext::new(self.link.is_connected())
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(self.session_id.as_str(), diagnostic);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            session_id: self.session_id.clone(),
            transcript: self.assembler.transcript().clone(),
            connected: self.link.is_connected(),
            busy: self.assembler.is_busy(),
            files: self.files.clone(),
        });
    }
}

async fn next_connect(
    pending: &mut Option<PendingConnect>,
) -> Result<Box<dyn Connection>, TransportError> {
    match pending {
        Some(attempt) => attempt.await,
        None => future::pending().await,
    }
}

async fn retry_elapsed(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}

async fn next_frame(
    connection: &mut Option<Box<dyn Connection>>,
) -> Option<Result<RawFrame, TransportError>> {
    match connection {
        Some(connection) => connection.recv().await,
        None => future::pending().await,
    }
}
