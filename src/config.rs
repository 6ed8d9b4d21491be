use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable holding the Groq API key. Kept out of the config
/// file: the key is a secret, not a setting.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate recorded clips are resampled to before upload
    pub sample_rate: u32,
    pub channels: u16,
    /// Default microphone capture length in seconds
    pub record_duration_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_url: String,
    pub model: String,
    pub response_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "whisper-relay".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            record_duration_secs: 10,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/audio/transcriptions".to_string(),
            model: "whisper-large-v3-turbo".to_string(),
            response_format: "verbose_json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file (if present) plus `WHISPER_RELAY__*`
    /// environment overrides. A missing file falls back to built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("WHISPER_RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Resolve the API key from the environment. Absence is a startup-time
    /// failure for any command that transcribes.
    pub fn api_key(&self) -> Result<String> {
        let key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} is not set; export a Groq API key first", API_KEY_ENV))?;
        if key.trim().is_empty() {
            anyhow::bail!("{} is set but empty", API_KEY_ENV);
        }
        Ok(key)
    }
}
