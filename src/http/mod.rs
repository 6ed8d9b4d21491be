//! HTTP front-end for browser/session use
//!
//! This module exposes the pipeline over a REST API:
//! - POST /transcriptions — multipart audio upload, returns the transcript
//! - POST /recordings — record from the microphone, then transcribe
//! - GET  /transcriptions/latest — most recent result for this session
//! - POST /transcriptions/export — write the latest transcript to a file
//! - GET  /health — health check

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
