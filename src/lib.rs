//! perfchat - streaming chat client for the frame-time analysis service
//!
//! Keeps one WebSocket connection per session alive, classifies the JSON
//! frames the service streams back, and assembles them into an ordered
//! transcript of user and assistant turns.

pub mod config;
pub mod connection;
pub mod protocol;
pub mod session;
pub mod transcript;

pub use config::{ClientConfig, ConfigError};
pub use connection::{ReconnectPolicy, TransportError, WsConnector};
pub use protocol::{ChartSpec, DecodeError, FileDescriptor, InboundFrame, TokenUsage};
pub use session::{
    Diagnostic, DiagnosticSink, SessionError, SessionHandle, SessionId, SessionOptions,
    SessionRuntime, SessionSnapshot, TracingDiagnostics,
};
pub use transcript::{Role, Transcript, Turn, TurnId};
