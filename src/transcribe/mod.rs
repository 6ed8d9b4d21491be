//! Transcription via Groq's hosted Whisper API.

mod client;

pub use client::{
    MultiLanguageTranscript, Transcription, TranscriptionClient, TranscriptionError,
};
