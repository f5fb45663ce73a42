//! Mock implementations for testing
//!
//! These mocks let the session runtime run against in-memory connections.

use super::diagnostics::{Diagnostic, DiagnosticSink};
use super::{SessionId, SessionSnapshot};
use crate::connection::{Connection, Connector, RawFrame, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

// ============================================================================
// Mock Connector
// ============================================================================

/// What the mock does with one connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Refuse,
    Accept,
}

/// Connector that follows queued plans, then falls back to a default
pub struct MockConnector {
    plans: Mutex<VecDeque<Plan>>,
    fallback: Plan,
    attempts: Mutex<Vec<Instant>>,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl MockConnector {
    /// Queued plans first, then accept every attempt. Accepted connections
    /// are handed to the test through the returned receiver.
    pub fn with_plans(plans: Vec<Plan>) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, server_rx) = mpsc::unbounded_channel();
        let connector = Self {
            plans: Mutex::new(plans.into()),
            fallback: Plan::Accept,
            attempts: Mutex::new(Vec::new()),
            servers,
        };
        (Arc::new(connector), server_rx)
    }

    pub fn accepting() -> (Arc<Self>, mpsc::UnboundedReceiver<ServerEnd>) {
        Self::with_plans(Vec::new())
    }

    /// Refuses every attempt
    pub fn refusing() -> Arc<Self> {
        let (servers, _) = mpsc::unbounded_channel();
        Arc::new(Self {
            plans: Mutex::new(VecDeque::new()),
            fallback: Plan::Refuse,
            attempts: Mutex::new(Vec::new()),
            servers,
        })
    }

    /// When each attempt started
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, session_id: &SessionId) -> Result<Box<dyn Connection>, TransportError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        match plan {
            Plan::Refuse => Err(TransportError::Connect {
                url: format!("mock://ws/chat/{session_id}"),
                reason: "connection refused".to_string(),
            }),
            Plan::Accept => {
                let (connection, server) = mock_pair();
                let _ = self.servers.send(server);
                Ok(Box::new(connection))
            }
        }
    }
}

// ============================================================================
// Mock Connection
// ============================================================================

fn mock_pair() -> (MockConnection, ServerEnd) {
    let (to_client, inbound) = mpsc::unbounded_channel();
    let (outbound, from_client) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MockConnection {
            inbound,
            outbound,
            closed: Arc::clone(&closed),
        },
        ServerEnd {
            to_client,
            from_client,
            closed,
        },
    )
}

struct MockConnection {
    inbound: mpsc::UnboundedReceiver<RawFrame>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<RawFrame, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// The server's side of a mock connection. Dropping it closes the
/// connection from the server side.
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<RawFrame>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl ServerEnd {
    pub fn send_text(&self, text: &str) {
        let _ = self.to_client.send(RawFrame::Text(text.to_string()));
    }

    pub fn send_json(&self, value: &Value) {
        self.send_text(&value.to_string());
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        let _ = self.to_client.send(RawFrame::Binary(bytes));
    }

    /// Next text frame the client transmitted
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Whether the client closed the connection
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Recording Diagnostics
// ============================================================================

#[derive(Default)]
pub struct RecordingDiagnostics {
    reported: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reported.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, _session_id: &str, diagnostic: Diagnostic) {
        self.reported.lock().unwrap().push(diagnostic);
    }
}

// ============================================================================
// Waiting helpers
// ============================================================================

/// Wait until a published snapshot satisfies `condition`
pub async fn wait_for(
    snapshots: &mut watch::Receiver<SessionSnapshot>,
    condition: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(60), snapshots.wait_for(condition))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session runtime dropped its snapshot sender")
        .clone()
}

/// Poll `condition` until it holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}
