//! Per-action transcription pipeline
//!
//! `TranscriptionSession` sequences one user action end to end:
//! - Accept input (file upload or fixed-duration microphone capture)
//! - Gate on the API upload limit, compressing oversized inputs
//! - Call the transcription API (once per requested language)
//! - Produce the session-scoped `TranscriptResult`

mod result;
mod session;

pub use result::TranscriptResult;
pub use session::TranscriptionSession;
