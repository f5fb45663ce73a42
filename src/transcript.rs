//! Transcript assembly
//!
//! Implements the Elm Architecture pattern: a pure [`transition`] decides what
//! a classified frame or user command does to the in-progress turn, and the
//! [`Assembler`] applies the resulting effects to the transcript.

mod assembler;
mod effect;
mod event;
mod state;
mod transition;
mod turn;

#[cfg(test)]
mod proptests;

pub use assembler::Assembler;
pub use effect::Effect;
pub use event::Event;
pub use state::{AssemblyContext, AssemblyState};
pub use transition::{transition, TransitionError, TransitionResult, CONNECTION_LOST};
pub use turn::{Role, Transcript, Turn, TurnId, TurnIds};
