use anyhow::Result;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, mono after mixdown)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate recorded clips are resampled to before upload
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            target_channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal default input device (all platforms)
/// - File: frame playback from a decoded audio file (tests/batch processing)
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the requested source
    pub fn create(
        source: AudioSource,
        config: AudioBackendConfig,
    ) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::Microphone => {
                let backend = super::mic::MicrophoneBackend::new(config);
                Ok(Box::new(backend))
            }

            AudioSource::File(path) => {
                let backend = super::file::FileBackend::new(path, config);
                Ok(Box::new(backend))
            }
        }
    }
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input (all platforms)
    Microphone,
    /// File input (for testing/batch processing)
    File(std::path::PathBuf),
}
