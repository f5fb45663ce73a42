//! Applies transition effects to the transcript

use super::{
    transition, AssemblyContext, AssemblyState, Effect, Event, Transcript, TransitionError,
    TurnIds,
};
use crate::protocol::{InboundFrame, OutboundFrame};

/// Sole owner and writer of the transcript and the in-progress reference
#[derive(Debug, Default)]
pub struct Assembler {
    state: AssemblyState,
    ids: TurnIds,
    transcript: Transcript,
    busy: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// True from a send until the next terminal or error frame
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Run one event through [`transition`] and apply the resulting edits.
    ///
    /// Returns the frames the caller must transmit, in order. A refused event
    /// leaves the assembler untouched.
    pub fn handle(
        &mut self,
        ctx: &AssemblyContext,
        event: Event,
    ) -> Result<Vec<OutboundFrame>, TransitionError> {
        let result = transition(&self.state, ctx, &mut self.ids, event)?;
        self.state = result.new_state;

        let mut outbound = Vec::new();
        for effect in result.effects {
            if let Some(frame) = self.apply(effect) {
                outbound.push(frame);
            }
        }
        Ok(outbound)
    }

    /// Shorthand for a server frame, which can never be refused
    pub fn handle_frame(&mut self, ctx: &AssemblyContext, frame: InboundFrame) {
        if let Err(e) = self.handle(ctx, Event::Frame(frame)) {
            tracing::warn!(error = %e, "Server frame refused by assembler");
        }
    }

    fn apply(&mut self, effect: Effect) -> Option<OutboundFrame> {
        match effect {
            Effect::AppendTurn(turn) => self.transcript.push(turn),

            Effect::AppendText { turn_id, delta } => {
                if let Some(turn) = self.transcript.get_mut(turn_id) {
                    turn.content.push_str(&delta);
                } else {
                    tracing::warn!(%turn_id, "Text for a turn that is no longer in the transcript");
                }
            }

            Effect::PushChart { turn_id, chart } => {
                if let Some(turn) = self.transcript.get_mut(turn_id) {
                    turn.charts.push(chart);
                } else {
                    tracing::warn!(%turn_id, "Chart for a turn that is no longer in the transcript");
                }
            }

            Effect::SetToolStatus { turn_id, label } => {
                if let Some(turn) = self.transcript.get_mut(turn_id) {
                    turn.tool_status = Some(label);
                }
            }

            Effect::SetUsage { turn_id, usage } => {
                if let Some(turn) = self.transcript.get_mut(turn_id) {
                    turn.usage = Some(usage);
                }
            }

            Effect::FinishTurn {
                turn_id,
                usage,
                error,
            } => {
                if let Some(turn) = self.transcript.get_mut(turn_id) {
                    turn.streaming = false;
                    turn.tool_status = None;
                    if usage.is_some() {
                        turn.usage = usage;
                    }
                    turn.error = error;
                }
            }

            Effect::ClearTranscript => self.transcript.clear(),

            Effect::SetBusy(busy) => self.busy = busy,

            Effect::Transmit(frame) => return Some(frame),
        }
        None
    }
}
