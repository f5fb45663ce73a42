//! Effects produced by assembler transitions

use super::{Turn, TurnId};
use crate::protocol::{ChartSpec, OutboundFrame, TokenUsage};

/// Edits and I/O requested by a transition, applied in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a new turn to the transcript
    AppendTurn(Turn),

    /// Append streamed text to a turn
    AppendText { turn_id: TurnId, delta: String },

    /// Attach a chart to a turn
    PushChart { turn_id: TurnId, chart: ChartSpec },

    /// Replace a turn's tool-status label
    SetToolStatus { turn_id: TurnId, label: String },

    /// Record usage metering on a turn
    SetUsage { turn_id: TurnId, usage: TokenUsage },

    /// End streaming for a turn and clear its tool-status label.
    /// `usage` replaces the recorded usage only when present.
    FinishTurn {
        turn_id: TurnId,
        usage: Option<TokenUsage>,
        error: Option<String>,
    },

    /// Drop every turn
    ClearTranscript,

    /// Update the busy flag exposed to the presentation layer
    SetBusy(bool),

    /// Send a frame to the server
    Transmit(OutboundFrame),
}

impl Effect {
    pub fn finish(turn_id: TurnId, usage: Option<TokenUsage>) -> Self {
        Effect::FinishTurn {
            turn_id,
            usage,
            error: None,
        }
    }

    pub fn abort(turn_id: TurnId, message: impl Into<String>) -> Self {
        Effect::FinishTurn {
            turn_id,
            usage: None,
            error: Some(message.into()),
        }
    }
}
