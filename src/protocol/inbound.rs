//! Inbound frames and the classifier that decodes them

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Frame type tags understood by [`classify`]
const KNOWN_TYPES: &[&str] = &[
    "text_delta",
    "chart",
    "tool_status",
    "token_usage",
    "message_end",
    "error",
];

/// Chart specification produced by the analysis service.
///
/// Carried through the client untouched; only the renderer interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSpec(pub Value);

impl ChartSpec {
    pub fn new(spec: Value) -> Self {
        Self(spec)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Token usage reported for one assistant response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
}

impl TokenUsage {
    pub fn new(model: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            model: model.into(),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A decoded server frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Incremental text for the current assistant turn
    TextDelta { content: String },
    /// A chart to attach to the current assistant turn
    Chart { data: ChartSpec },
    /// Human-readable label for the tool currently running
    ToolStatus { content: String },
    /// Usage metering for the current assistant turn
    TokenUsage(TokenUsage),
    /// Terminates the current assistant turn
    MessageEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charts: Option<Vec<ChartSpec>>,
        /// A malformed bundle is dropped rather than the whole frame, so the
        /// turn still finishes.
        #[serde(
            default,
            deserialize_with = "lenient_usage",
            skip_serializing_if = "Option::is_none"
        )]
        token_usage: Option<TokenUsage>,
    },
    /// Aborts the current assistant turn
    Error { content: String },
}

impl InboundFrame {
    /// The wire tag of this frame, for logging
    pub fn frame_type(&self) -> &'static str {
        match self {
            InboundFrame::TextDelta { .. } => "text_delta",
            InboundFrame::Chart { .. } => "chart",
            InboundFrame::ToolStatus { .. } => "tool_status",
            InboundFrame::TokenUsage(_) => "token_usage",
            InboundFrame::MessageEnd { .. } => "message_end",
            InboundFrame::Error { .. } => "error",
        }
    }

    /// Whether this frame ends the in-progress response
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InboundFrame::MessageEnd { .. } | InboundFrame::Error { .. }
        )
    }
}

/// Why an inbound frame was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("frame has no string `type` tag")]
    MissingType,
    #[error("unknown frame type `{0}`")]
    UnknownType(String),
    #[error("malformed `{frame_type}` frame: {reason}")]
    Malformed { frame_type: String, reason: String },
    #[error("binary frame is not UTF-8 text")]
    NotText,
}

fn lenient_usage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TokenUsage>, D::Error> {
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(usage) => Ok(Some(usage)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed token usage bundled with message_end");
            Ok(None)
        }
    }
}

/// Decode one text frame into a typed [`InboundFrame`].
///
/// Never panics: anything that is not a well-formed known frame comes back as
/// a [`DecodeError`] for the caller to report and drop.
pub fn classify(raw: &str) -> Result<InboundFrame, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let frame_type = match value.get("type") {
        Some(Value::String(tag)) => tag.clone(),
        _ => return Err(DecodeError::MissingType),
    };

    if !KNOWN_TYPES.contains(&frame_type.as_str()) {
        return Err(DecodeError::UnknownType(frame_type));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
        frame_type,
        reason: e.to_string(),
    })
}

/// Decode a binary frame, which the server only sends as UTF-8 JSON
pub fn classify_bytes(raw: &[u8]) -> Result<InboundFrame, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NotText)?;
    classify(text)
}
