pub mod audio;
pub mod compress;
pub mod config;
pub mod export;
pub mod http;
pub mod session;
pub mod transcribe;

pub use audio::{
    write_wav, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame,
    AudioSource, FileBackend, MicrophoneBackend,
};
pub use compress::{calculate_bitrate, Compressor, MAX_UPLOAD_BYTES, TARGET_SIZE_KB};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{TranscriptResult, TranscriptionSession};
pub use transcribe::{TranscriptionClient, TranscriptionError};
