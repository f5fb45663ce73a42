//! Assembler state types

use super::TurnId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether an assistant turn is currently receiving streamed content.
///
/// This is the only reference to the in-progress turn; there is never more
/// than one, and it always names the newest assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyState {
    #[default]
    Idle,
    Streaming { turn_id: TurnId },
}

impl AssemblyState {
    pub fn in_progress(&self) -> Option<TurnId> {
        match self {
            AssemblyState::Idle => None,
            AssemblyState::Streaming { turn_id } => Some(*turn_id),
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, AssemblyState::Streaming { .. })
    }
}

/// Inputs to a transition that come from outside the assembler
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    /// Whether the transport currently reports a live connection
    pub connected: bool,
    /// Timestamp for any turn created by the transition
    pub now: DateTime<Utc>,
}

impl AssemblyContext {
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            now: Utc::now(),
        }
    }
}
