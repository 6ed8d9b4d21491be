use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of one transcription run.
///
/// Session-scoped: the front-ends keep the most recent result and overwrite
/// it on the next successful run. A failed run leaves the previous result
/// untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Identifier for this run (logs, HTTP responses)
    pub id: Uuid,

    /// Recovered text. For multi-language runs this is the per-language
    /// sections joined into one display block.
    pub text: String,

    /// Wall-clock seconds spent in the API call(s)
    pub elapsed_seconds: f64,

    /// Per-language transcripts when more than one language was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_language: Option<BTreeMap<String, String>>,

    /// When the run finished
    pub created_at: DateTime<Utc>,
}
