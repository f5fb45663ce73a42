//! Descriptor of a file accepted by the upload endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the upload endpoint returns for an accepted capture.
///
/// The chat protocol refers to uploaded files by `file_id`; the remaining
/// fields are the summary the server computed while parsing the capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub file_id: String,
    pub filename: String,
    #[serde(default)]
    pub source_tool: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub columns_available: u32,
    #[serde(default)]
    pub columns_na: u32,
    /// Derived metrics (average FPS, frame-time stats, present modes)
    #[serde(default)]
    pub profile: Value,
}

impl FileDescriptor {
    /// Parse the body of an upload response
    pub fn from_upload_response(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
