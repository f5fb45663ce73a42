//! Pure state transition function
//!
//! Given the current assembly state and one event, decide the next state and
//! the transcript edits that realize it. No I/O happens here; the
//! [`super::Assembler`] applies the returned effects.

use super::{AssemblyContext, AssemblyState, Effect, Event, Turn, TurnIds};
use crate::protocol::{InboundFrame, OutboundFrame};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AssemblyState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AssemblyState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events the assembler refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("not connected, message was not sent")]
    NotConnected,
    #[error("message is empty")]
    EmptyMessage,
}

/// Error recorded on a turn abandoned because the connection dropped
pub const CONNECTION_LOST: &str = "connection lost";

/// Pure transition function.
///
/// `ids` is the only mutable input: it hands out ids for turns created by
/// this transition.
pub fn transition(
    state: &AssemblyState,
    ctx: &AssemblyContext,
    ids: &mut TurnIds,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (*state, event) {
        // ============================================================
        // User commands
        // ============================================================
        (_, Event::UserSend { .. }) if !ctx.connected => Err(TransitionError::NotConnected),

        (_, Event::UserSend { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        // Local echo first; the frame goes out only after the turn exists.
        (state, Event::UserSend { text }) => {
            let turn = Turn::user(ids.next_id(), text.clone(), ctx.now);
            Ok(TransitionResult::new(state)
                .with_effect(Effect::AppendTurn(turn))
                .with_effect(Effect::SetBusy(true))
                .with_effect(Effect::Transmit(OutboundFrame::user_message(text))))
        }

        // Reset also drops the in-progress reference so late frames start a
        // fresh turn instead of touching a cleared one.
        (_, Event::Reset) => {
            Ok(TransitionResult::new(AssemblyState::Idle).with_effect(Effect::ClearTranscript))
        }

        // The server will not resume a reply on a new connection, so the
        // partial turn is closed off and the next reply starts a fresh one.
        (state, Event::ConnectionLost) => {
            let abort = state
                .in_progress()
                .map(|turn_id| Effect::abort(turn_id, CONNECTION_LOST));

            Ok(TransitionResult::new(AssemblyState::Idle)
                .with_effects(abort)
                .with_effect(Effect::SetBusy(false)))
        }

        // ============================================================
        // Streamed content
        // ============================================================
        (AssemblyState::Idle, Event::Frame(InboundFrame::TextDelta { content })) => {
            let turn_id = ids.next_id();
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::AppendTurn(Turn::streaming(
                    turn_id,
                    content,
                    vec![],
                    ctx.now,
                ))))
        }

        (AssemblyState::Streaming { turn_id }, Event::Frame(InboundFrame::TextDelta { content })) => {
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::AppendText {
                    turn_id,
                    delta: content,
                }))
        }

        (AssemblyState::Idle, Event::Frame(InboundFrame::Chart { data })) => {
            let turn_id = ids.next_id();
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::AppendTurn(Turn::streaming(
                    turn_id,
                    String::new(),
                    vec![data],
                    ctx.now,
                ))))
        }

        (AssemblyState::Streaming { turn_id }, Event::Frame(InboundFrame::Chart { data })) => {
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::PushChart {
                    turn_id,
                    chart: data,
                }))
        }

        // Status and usage only attach to a turn that exists
        (
            AssemblyState::Idle,
            Event::Frame(InboundFrame::ToolStatus { .. } | InboundFrame::TokenUsage(_)),
        ) => Ok(TransitionResult::new(AssemblyState::Idle)),

        (AssemblyState::Streaming { turn_id }, Event::Frame(InboundFrame::ToolStatus { content })) => {
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::SetToolStatus {
                    turn_id,
                    label: content,
                }))
        }

        (AssemblyState::Streaming { turn_id }, Event::Frame(InboundFrame::TokenUsage(usage))) => {
            Ok(TransitionResult::new(AssemblyState::Streaming { turn_id })
                .with_effect(Effect::SetUsage { turn_id, usage }))
        }

        // ============================================================
        // Terminal frames
        // ============================================================
        (state, Event::Frame(InboundFrame::MessageEnd {
            charts,
            token_usage,
        })) => {
            let finish = state
                .in_progress()
                .map(|turn_id| Effect::finish(turn_id, token_usage));
            let trailing: Vec<Effect> = charts
                .unwrap_or_default()
                .into_iter()
                .map(|chart| Effect::AppendTurn(Turn::chart_only(ids.next_id(), chart, ctx.now)))
                .collect();

            Ok(TransitionResult::new(AssemblyState::Idle)
                .with_effects(finish)
                .with_effects(trailing)
                .with_effect(Effect::SetBusy(false)))
        }

        (state, Event::Frame(InboundFrame::Error { content })) => {
            let abort = state
                .in_progress()
                .map(|turn_id| Effect::abort(turn_id, content));

            Ok(TransitionResult::new(AssemblyState::Idle)
                .with_effects(abort)
                .with_effect(Effect::SetBusy(false)))
        }
    }
}
