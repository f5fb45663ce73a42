//! Turns and the transcript that holds them

use crate::protocol::{ChartSpec, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a turn, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// Hands out turn ids. Ids are never reused within a session, resets included.
#[derive(Debug, Default)]
pub struct TurnIds {
    last: u64,
}

impl TurnIds {
    pub fn next_id(&mut self) -> TurnId {
        self.last += 1;
        TurnId(self.last)
    }
}

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message-equivalent unit of the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    pub charts: Vec<ChartSpec>,
    /// Label of the tool the service is running; only set while streaming
    pub tool_status: Option<String>,
    pub usage: Option<TokenUsage>,
    pub streaming: bool,
    /// Set when an `error` frame aborted this turn
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// A complete user turn
    pub fn user(id: TurnId, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role: Role::User,
            content: text.into(),
            charts: Vec::new(),
            tool_status: None,
            usage: None,
            streaming: false,
            error: None,
            created_at,
        }
    }

    /// An assistant turn that will receive streamed content
    pub fn streaming(
        id: TurnId,
        content: impl Into<String>,
        charts: Vec<ChartSpec>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            charts,
            tool_status: None,
            usage: None,
            streaming: true,
            error: None,
            created_at,
        }
    }

    /// A finished, content-less assistant turn holding one trailing chart
    pub fn chart_only(id: TurnId, chart: ChartSpec, created_at: DateTime<Utc>) -> Self {
        Self {
            streaming: false,
            ..Self::streaming(id, String::new(), vec![chart], created_at)
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// Insertion-ordered turns of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().rev().find(|turn| turn.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    // The in-progress turn is the newest assistant turn, so search from the back.
    pub(crate) fn get_mut(&mut self, id: TurnId) -> Option<&mut Turn> {
        self.turns.iter_mut().rev().find(|turn| turn.id == id)
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
