//! Events that drive the assembler

use crate::protocol::InboundFrame;

/// Inputs to [`super::transition`]
#[derive(Debug, Clone)]
pub enum Event {
    /// A classified server frame
    Frame(InboundFrame),
    /// The user submitted a message
    UserSend { text: String },
    /// Start over with an empty transcript
    Reset,
    /// The connection dropped; any reply in flight is abandoned
    ConnectionLost,
}

impl Event {
    pub fn user_send(text: impl Into<String>) -> Self {
        Event::UserSend { text: text.into() }
    }
}

impl From<InboundFrame> for Event {
    fn from(frame: InboundFrame) -> Self {
        Event::Frame(frame)
    }
}
