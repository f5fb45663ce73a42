//! Wire protocol spoken over the chat WebSocket
//!
//! Inbound frames are JSON objects discriminated by a `type` tag; the only
//! outbound frame is the user's message.

mod files;
pub mod inbound;
pub mod outbound;

pub use files::FileDescriptor;
pub use inbound::{classify, classify_bytes, ChartSpec, DecodeError, InboundFrame, TokenUsage};
pub use outbound::OutboundFrame;
