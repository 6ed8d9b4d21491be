pub mod backend;
pub mod file;
pub mod format;
pub mod mic;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use file::{write_wav, AudioFile, FileBackend};
pub use format::{is_valid_audio_format, mime_for_path};
pub use mic::MicrophoneBackend;
